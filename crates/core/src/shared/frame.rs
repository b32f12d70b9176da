/// One captured camera frame as handed to the landmark detector.
///
/// Pixels are packed RGB rows (`width * height * 3` bytes) for live mesh
/// detectors. The core never inspects them and passes the frame through
/// untouched. Replaying detectors key on the index alone, which is the
/// frame's position in the capture stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A pixel-less frame, for detectors that replay results by index.
    pub fn placeholder(index: usize) -> Self {
        Self::new(Vec::new(), 0, 0, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
