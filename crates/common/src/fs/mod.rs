pub mod temp_script;

pub use temp_script::{
    create_temp_file, set_executable, set_executable_async, write_text, write_text_async,
    EXECUTABLE_MODE,
};
