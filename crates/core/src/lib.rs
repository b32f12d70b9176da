pub mod shared {
    pub mod constants;
    pub mod frame;
}

pub mod landmarks {
    pub mod domain {
        pub mod detected_face;
        #[cfg(test)]
        pub(crate) mod fixtures;
        pub mod landmark_detector;
        pub mod landmark_point;
        pub mod landmark_selector;
    }
    pub mod infrastructure;
}

pub mod features {
    pub mod domain {
        pub mod feature_extractor;
        pub mod signature;
    }
}

pub mod matching {
    pub mod domain {
        pub mod matcher;
    }
}

pub mod templates {
    pub mod domain {
        pub mod template;
        pub mod template_store;
    }
    pub mod infrastructure;
}

pub mod enrollment {
    pub mod domain {
        pub mod enrollment_session;
    }
}

pub mod pipeline {
    pub mod face_pipeline;
    pub mod infrastructure;
    pub mod recognize_faces_use_case;
}
