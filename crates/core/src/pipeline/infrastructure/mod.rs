pub mod threaded_face_pipeline;
