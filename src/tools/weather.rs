//! Weather report tool
//!
//! Synthesizes a plausible report from a fixed set of readings. Stands in
//! for a real weather lookup; the name and payload shape are the contract.

use super::{Tool, ToolOutput};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::{json, Value};

const TEMPERATURES_C: &[u8] = &[18, 20, 22, 25, 28];
const CONDITIONS: &[&str] = &["Sunny", "Partly Cloudy", "Clear Skies", "Light Breeze"];

/// Weather tool for farm planning
pub struct WeatherTool;

impl WeatherTool {
    fn report() -> String {
        let mut rng = rand::thread_rng();
        let temp = TEMPERATURES_C.choose(&mut rng).copied().unwrap_or(20);
        let cond = CONDITIONS.choose(&mut rng).copied().unwrap_or("Sunny");
        format!("The current weather is {temp}°C with {cond}. It's a great day for farming!")
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &'static str {
        "getWeatherReport"
    }

    fn description(&self) -> String {
        "Get the current weather report for the user's location to help with farm planning."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {},
            "required": []
        })
    }

    fn result_key(&self) -> &'static str {
        "weather"
    }

    async fn run(&self, _input: Value) -> ToolOutput {
        ToolOutput::success(Self::report())
    }
}
