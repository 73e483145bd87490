pub mod chat;
pub mod weather;

pub use chat::{ChatRequest, ChatResponse};
pub use weather::{ExtremeWeatherRequest, ExtremeWeatherResponse, TodaySummary};
