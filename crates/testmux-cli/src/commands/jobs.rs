//! Job commands.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use testmux_core::JobRequest;

pub async fn submit(
    api_url: &str,
    org_id: String,
    app_version_id: String,
    test_path: String,
    priority: String,
    target: String,
) -> Result<()> {
    let request = JobRequest {
        org_id,
        app_version_id,
        test_path,
        priority: Some(priority),
        target,
    };

    let response = reqwest::Client::new()
        .post(format!("{api_url}/jobs"))
        .json(&request)
        .send()
        .await
        .context("failed to reach the API server")?;

    if !response.status().is_success() {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or_default();
        bail!(
            "submission rejected ({status}): {}",
            body["error"].as_str().unwrap_or("unknown error")
        );
    }

    let body: Value = response.json().await?;
    println!("Job submitted.");
    println!("Job ID: {}", body["job_id"].as_str().unwrap_or_default());
    Ok(())
}

pub async fn status(api_url: &str, job_id: &str) -> Result<()> {
    let job = fetch_job(api_url, job_id).await?;
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

pub async fn poll(api_url: &str, job_id: &str, interval: u64) -> Result<()> {
    println!("Polling job {job_id} until it settles...");
    loop {
        let job = fetch_job(api_url, job_id).await?;
        let status = job["status"].as_str().unwrap_or("unknown");
        println!("Current status: {status}");
        match status {
            "completed" => return Ok(()),
            "failed" => bail!("job {job_id} finished with status: failed"),
            _ => tokio::time::sleep(Duration::from_secs(interval)).await,
        }
    }
}

async fn fetch_job(api_url: &str, job_id: &str) -> Result<Value> {
    let response = reqwest::Client::new()
        .get(format!("{api_url}/jobs/{job_id}"))
        .send()
        .await
        .context("failed to reach the API server")?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        bail!("job {job_id} not found");
    }
    let response = response.error_for_status()?;
    Ok(response.json().await?)
}
