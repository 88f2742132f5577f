#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::Router;
use crop_risk_client::{Config, RawSensorReading};
use serde_json::Value;

/// Bodies received by a fake endpoint, in arrival order.
#[derive(Clone, Default)]
pub struct Recorded(pub Arc<Mutex<Vec<Value>>>);

impl Recorded {
    pub fn push(&self, body: Value) {
        self.0.lock().unwrap().push(body);
    }

    pub fn all(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }
}

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn config_for(base_url: &str) -> Config {
    Config {
        prediction_base_url: base_url.to_string(),
        analysis_base_url: base_url.to_string(),
        export_dir: scratch_dir(),
        ..Config::default()
    }
}

pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("crop-risk-test-{}", uuid::Uuid::new_v4()))
}

pub fn sample_reading() -> RawSensorReading {
    RawSensorReading {
        solar_radiation: "500".into(),
        humidity: "60".into(),
        conductivity: "1.2".into(),
        phosphorous: "10".into(),
        ph_value: "6.5".into(),
        temperature: "25".into(),
        nitrogen: "20".into(),
        potassium: "15".into(),
    }
}

pub fn leaf_spot_response() -> Value {
    serde_json::json!({
        "predicted_disease": "Leaf Spot",
        "predicted_pest_attacks": {
            "Flea Beetle": "12%",
            "Thrips": "5%",
            "Mealybug": "3%",
            "Jassids": "8%",
            "Red-Spider Mites": "2%",
            "Leaf Eating Caterpillar": "4%"
        }
    })
}
