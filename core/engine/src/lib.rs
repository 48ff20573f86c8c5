pub mod colour;
pub mod dashboard;
pub mod diary;
pub mod models;
pub mod period;
pub mod resolver;
pub mod stats;

pub use colour::{Colour, ColourScale, MidPointColourScale, Rgb};
pub use dashboard::Dashboard;
pub use diary::{DiaryLayout, SleepDiary};
pub use models::{decode, Decoded, StatKind, StatModel};
pub use period::Period;
pub use resolver::DateAxisResolver;
