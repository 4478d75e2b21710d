pub mod codec;
pub mod formats;
pub mod image;
pub mod palette;

use log::*;
use std::fs::File;
use std::io::Write;

pub use crate::formats::{all_formats, auto_detect, FormatHandler, Verdict};
pub use crate::image::format::{Frame, Image, Palette};

pub fn init_logging() {
    let target = Box::new(File::create("log.txt").expect("Can't create file"));

    env_logger::Builder::new()
        .target(env_logger::Target::Pipe(target))
        .filter(Some("lib_gameimg"), LevelFilter::Debug)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}
