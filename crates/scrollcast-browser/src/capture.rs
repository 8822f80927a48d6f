//! Page capture: launch, navigate, wait for network idle, scroll, record.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use scrollcast_media::FfmpegRunner;

use crate::config::CaptureConfig;
use crate::error::{CaptureError, CaptureResult};
use crate::network_idle::{network_events, wait_for_idle};
use crate::recorder::ScreencastRecorder;
use crate::scroll::{scroll_script, ScrollOutcome, ScrollState, SCROLL_HEIGHT_SCRIPT};

/// How long to wait for the CDP handler task after the browser closes.
const HANDLER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Executable names probed when no browser path is configured.
const CHROME_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Records a scrolling page to an H.264 video file.
#[derive(Debug, Clone)]
pub struct PageRecorder {
    config: CaptureConfig,
    runner: FfmpegRunner,
}

impl PageRecorder {
    pub fn new(config: CaptureConfig, runner: FfmpegRunner) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Record `url` to `output`.
    ///
    /// The browser is closed before returning, on success and on failure.
    pub async fn capture(&self, url: &str, output: &Path) -> CaptureResult<PathBuf> {
        let (browser, handler) = self.launch().await?;
        let result = self.record(&browser, url, output).await;
        shutdown(browser, handler).await;
        result
    }

    async fn launch(&self) -> CaptureResult<(Browser, JoinHandle<()>)> {
        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| CaptureError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        Ok((browser, handler))
    }

    fn browser_config(&self) -> CaptureResult<BrowserConfig> {
        let viewport = self.config.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(viewport.width, viewport.height)
            .viewport(CdpViewport {
                width: viewport.width,
                height: viewport.height,
                ..Default::default()
            })
            .request_timeout(self.config.navigation_timeout)
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        if let Some(path) = &self.config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if self.config.no_sandbox {
            builder = builder.no_sandbox();
        }

        builder.build().map_err(CaptureError::Launch)
    }

    async fn record(&self, browser: &Browser, url: &str, output: &Path) -> CaptureResult<PathBuf> {
        let page = browser.new_page("about:blank").await?;
        self.navigate(&page, url).await?;

        let recorder = ScreencastRecorder::start(&page, &self.runner, output, &self.config).await?;
        let scrolled = self.scroll(&page).await;
        // the encoder must be flushed even when scrolling failed
        let stopped = recorder.stop().await;

        let outcome = scrolled?;
        let stats = stopped?;
        info!(
            "Captured {} ({:?}, {} frames) to {}",
            url,
            outcome,
            stats.frames_written,
            output.display()
        );
        Ok(output.to_path_buf())
    }

    /// Navigate and wait for network idle, bounded by the navigation timeout.
    async fn navigate(&self, page: &Page, url: &str) -> CaptureResult<()> {
        let timeout = self.config.navigation_timeout;
        let idle = self.config.network_idle;

        let navigated = tokio::time::timeout(timeout, async {
            let events = network_events(page).await?;
            page.goto(url)
                .await
                .map_err(|e| CaptureError::navigation(url, e))?;
            wait_for_idle(events, idle).await;
            Ok::<_, CaptureError>(())
        })
        .await;

        match navigated {
            Ok(result) => result,
            Err(_) => Err(CaptureError::NavigationTimeout(timeout.as_secs())),
        }
    }

    /// Scroll to the bottom of the page, one step per tick.
    async fn scroll(&self, page: &Page) -> CaptureResult<ScrollOutcome> {
        let plan = self.config.scroll;
        let mut state = ScrollState::new(plan, self.config.max_duration);
        let mut height = self.eval_height(page, SCROLL_HEIGHT_SCRIPT).await?;

        let mut ticker = interval(plan.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let step = state.next_step(height);
            height = self.eval_height(page, &scroll_script(step)).await?;

            if let Some(outcome) = state.record(step, height) {
                if outcome == ScrollOutcome::TimeLimit {
                    warn!(
                        "Scroll stopped by time limit after {}px of {}px",
                        state.distance(),
                        height
                    );
                }
                return Ok(outcome);
            }
        }
    }

    async fn eval_height(&self, page: &Page, script: &str) -> CaptureResult<f64> {
        page.evaluate_expression(script)
            .await
            .map_err(CaptureError::script)?
            .into_value::<f64>()
            .map_err(CaptureError::script)
    }
}

/// Close the browser and join its handler task. Failures are logged only.
async fn shutdown(mut browser: Browser, mut handler: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        warn!("Failed to close browser: {}", e);
    }
    if let Err(e) = browser.wait().await {
        warn!("Failed to reap browser process: {}", e);
    }
    if tokio::time::timeout(HANDLER_SHUTDOWN_TIMEOUT, &mut handler)
        .await
        .is_err()
    {
        handler.abort();
    }
}

/// Resolve the browser executable: explicit path first, then well-known names on `PATH`.
pub fn resolve_chrome(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => which::which(path).ok(),
        None => CHROME_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok()),
    }
}
