pub mod input;
pub mod output;

pub use input::{parse_chapter_file, parse_chapter_json, ChapterInput};
pub use output::{result_to_json_string, write_result_json, OutputResult, OutputSegment};
