use std::fmt::{self, Display};
use std::time::Duration;

use clap::Args;
use log::{debug, info};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

const MAX_UPLOAD_BYTES: u64 = 1_000_000_000;

#[derive(Args, Clone, Debug)]
#[group(id = "throughput")]
pub struct Params {
    /// After a run with --count, also measure download and upload throughput
    #[arg(long = "throughput", env = "PING_THROUGHPUT", default_value = "false")]
    pub enabled: bool,

    /// Endpoint that serves a large body for the download measurement
    #[arg(
        long,
        env = "THROUGHPUT_DOWNLOAD_URL",
        default_value = "https://speed.cloudflare.com/__down?bytes=10000000"
    )]
    download_url: String,

    /// Endpoint that accepts a POST body for the upload measurement
    #[arg(
        long,
        env = "THROUGHPUT_UPLOAD_URL",
        default_value = "https://speed.cloudflare.com/__up"
    )]
    upload_url: String,

    /// How many bytes to upload, at most 1 GB (the body is held in memory)
    #[arg(
        long,
        env = "THROUGHPUT_UPLOAD_BYTES",
        default_value = "2000000",
        value_parser = clap::value_parser!(u64).range(1..=MAX_UPLOAD_BYTES)
    )]
    upload_bytes: u64,

    /// Upper bound for each of the two requests, in seconds
    #[arg(long, env = "THROUGHPUT_TIMEOUT_SECS", default_value = "60")]
    request_timeout_secs: u64,
}

/// Both values are finite and never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThroughputResult {
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Download,
    Upload,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Download => write!(f, "download"),
            Phase::Upload => write!(f, "upload"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ThroughputError {
    #[error("failed to set up HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("{phase} request failed")]
    Request {
        phase: Phase,
        source: reqwest::Error,
    },

    #[error("{phase} request returned {status}")]
    Status { phase: Phase, status: StatusCode },

    #[error("failed to read {phase} response body")]
    Body {
        phase: Phase,
        source: reqwest::Error,
    },
}

/// Downloads, then uploads, one after the other. Independent of any ping state.
pub async fn measure(params: &Params) -> Result<ThroughputResult, ThroughputError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(params.request_timeout_secs))
        .build()
        .map_err(ThroughputError::Client)?;

    info!("Measuring download throughput from {}", params.download_url);
    let download_mbps = download(&client, &params.download_url).await?;
    info!("Measuring upload throughput to {}", params.upload_url);
    let upload_mbps = upload(&client, &params.upload_url, params.upload_bytes).await?;

    Ok(ThroughputResult {
        download_mbps,
        upload_mbps,
    })
}

async fn download(client: &Client, url: &str) -> Result<f64, ThroughputError> {
    use ThroughputError as E;
    let phase = Phase::Download;

    let start = Instant::now();
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|source| E::Request { phase, source })?;
    check_status(phase, &response)?;

    let mut received = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| E::Body { phase, source })?
    {
        received += chunk.len() as u64;
    }
    let elapsed = start.elapsed();
    debug!("Downloaded {} bytes in {:?}", received, elapsed);
    Ok(to_mbps(received, elapsed))
}

async fn upload(client: &Client, url: &str, byte_count: u64) -> Result<f64, ThroughputError> {
    use ThroughputError as E;
    let phase = Phase::Upload;

    let body = vec![0u8; byte_count as usize];
    let start = Instant::now();
    let response = client
        .post(url)
        .body(body)
        .send()
        .await
        .map_err(|source| E::Request { phase, source })?;
    check_status(phase, &response)?;
    // The exchange only counts as done once the server has answered in full
    response
        .bytes()
        .await
        .map_err(|source| E::Body { phase, source })?;
    let elapsed = start.elapsed();
    debug!("Uploaded {} bytes in {:?}", byte_count, elapsed);
    Ok(to_mbps(byte_count, elapsed))
}

fn check_status(phase: Phase, response: &Response) -> Result<(), ThroughputError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ThroughputError::Status { phase, status })
    }
}

/// Megabits per second, `0` for anything that isn't a finite positive rate.
pub fn to_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let mbps = bytes as f64 * 8.0 / elapsed.as_secs_f64() / 1_000_000.0;
    if mbps.is_finite() && mbps > 0.0 {
        mbps
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use assertor::*;

    use super::*;

    fn params(download_url: &str) -> Params {
        Params {
            enabled: true,
            download_url: download_url.to_string(),
            upload_url: "http://127.0.0.1:9/".to_string(),
            upload_bytes: 16,
            request_timeout_secs: 1,
        }
    }

    #[derive(clap::Parser, Debug)]
    struct TestCli {
        #[clap(flatten)]
        params: Params,
    }

    fn parse_upload_bytes(value: &str) -> Result<u64, clap::Error> {
        use clap::Parser;
        TestCli::try_parse_from(["ping-buddy", "--upload-bytes", value])
            .map(|it| it.params.upload_bytes)
    }

    #[test]
    fn upload_size_bounded() {
        // given, when, then
        assert_that!(parse_upload_bytes("1")).is_ok();
        assert_that!(parse_upload_bytes("1000000000")).is_ok();
        assert_that!(parse_upload_bytes("1000000001")).is_err();
        assert_that!(parse_upload_bytes("18446744073709551615")).is_err();
        assert_that!(parse_upload_bytes("0")).is_err();
    }

    #[test]
    fn mbps_from_bytes_and_time() {
        // given, when, then
        assert_that!(to_mbps(1_000_000, Duration::from_secs(1))).is_equal_to(8.0);
        assert_that!(to_mbps(250_000, Duration::from_millis(500))).is_equal_to(4.0);
    }

    #[test]
    fn mbps_clamped() {
        // given, when, then
        assert_that!(to_mbps(1_000, Duration::ZERO)).is_equal_to(0.0);
        assert_that!(to_mbps(0, Duration::ZERO)).is_equal_to(0.0);
        assert_that!(to_mbps(0, Duration::from_secs(3))).is_equal_to(0.0);
    }

    #[tokio::test]
    async fn invalid_url_fails_download_phase() {
        // given
        let params = params("not a url at all");

        // when
        let res = measure(&params).await;

        // then
        match res {
            Err(ThroughputError::Request { phase, .. }) => {
                assert_that!(phase).is_equal_to(Phase::Download)
            }
            other => panic!("expected download request error, got {:?}", other),
        }
    }
}
