pub mod in_memory_template_store;
pub mod json_file_template_store;
pub mod timeout_template_store;
