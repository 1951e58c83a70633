//! Temperature sensor walkthrough.
//!
//! Creates a regression model, streams a few labelled readings into it,
//! predicts, prints metrics and deletes the model again.
//!
//! Usage:
//!   KAPPAML_API_KEY=your_key RUST_LOG=kappaml=debug cargo run --example temp_sensor

use kappaml::{Features, KappaClient, MlType};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = KappaClient::from_env()?;

    let model_id = client
        .create_model("temp-sensor", MlType::Regression)
        .timeout(Duration::from_secs(120))
        .execute()
        .await?;
    println!("model {} deployed", model_id);

    let outcome = client
        .scope(|c| {
            let model_id = model_id.clone();
            Box::pin(async move {
                let readings = [(18.0, 18.4), (19.5, 19.9), (21.0, 21.3), (22.5, 22.8)];
                for (temp, next) in readings {
                    c.learn(&model_id, &Features::new().with("temp", temp), next)
                        .await?;
                }

                let prediction = c
                    .predict(&model_id, &Features::new().with("temp", 21.5))
                    .await?;
                println!("prediction: {}", serde_json::Value::Object(prediction));

                let metrics = c.get_metrics(&model_id).await?;
                println!("metrics: {}", serde_json::Value::Object(metrics));

                c.delete_model(&model_id).await
            })
        })
        .await;

    outcome?;
    println!("model {} deleted; session closed: {}", model_id, client.is_closed());
    Ok(())
}
