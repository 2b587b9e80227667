mod environment;
mod steering;
mod weather;

pub use environment::EnvironmentSystem;
pub use steering::SteeringSystem;
pub use weather::WeatherSystem;
