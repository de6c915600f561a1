use crate::{agent::{PageAgent, PageScript},
            browser::config::{ConnectionOptions, LaunchOptions},
            dom::{DomTree, MARKER_BORDER, MARKER_CLASS, NodePath},
            error::{CopilotError, Result},
            extract::ExtractedJobData};
use async_trait::async_trait;
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Snapshot captured by the most recent page script run
    last_snapshot: Option<DomTree>,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Listing sites gate content behind bot checks that look for these flags
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // The user may keep the page open for a long time between analyses
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| CopilotError::LaunchFailed(e.to_string()))?;

        browser.new_tab().map_err(|e| CopilotError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::info!("Launched browser ({})", if options.headless { "headless" } else { "headed" });
        Ok(Self { browser, last_snapshot: None })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url.clone(), Duration::from_millis(options.timeout))
            .map_err(|e| CopilotError::ConnectionFailed(e.to_string()))?;

        log::info!("Connected to browser at {}", options.ws_url);
        Ok(Self { browser, last_snapshot: None })
    }

    /// Get the active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| CopilotError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// Get the currently active tab by checking the document visibility and focus state
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        // Visible and focused is the strongest signal, visible alone the next best
        for check in [
            "document.visibilityState === 'visible' && document.hasFocus()",
            "document.visibilityState === 'visible'",
        ] {
            for tab in &tabs {
                match tab.evaluate(check, false) {
                    Ok(remote_object) => {
                        if remote_object.value.and_then(|v| v.as_bool()).unwrap_or(false) {
                            return Ok(tab.clone());
                        }
                    }
                    Err(e) => {
                        log::debug!("Failed to check tab status: {}", e);
                        continue;
                    }
                }
            }
        }

        // Headless tabs never report focus
        tabs.into_iter()
            .next()
            .ok_or_else(|| CopilotError::TabOperationFailed("No active tab found".to_string()))
    }

    /// Navigate the active tab to a URL and wait for the load to finish
    pub fn navigate(&self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .map_err(|e| CopilotError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
        tab.wait_until_navigated()
            .map_err(|e| CopilotError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        log::info!("Navigated to {}", url);
        Ok(())
    }

    /// Capture a snapshot of the active tab
    pub fn capture_snapshot(&self) -> Result<DomTree> {
        let tab = self
            .tab()
            .map_err(|e| CopilotError::PageUnavailable(e.to_string()))?;
        DomTree::from_tab(&tab)
    }

    /// Move the live marker to the element at `path` of `tree`
    ///
    /// Removes the marker class and border from every element that carries
    /// them, then applies both to the target. Returns false when the target
    /// cannot be addressed in the live page.
    pub fn apply_marker(&self, tree: &DomTree, path: &NodePath) -> Result<bool> {
        let Some(css_path) = tree.css_path(path) else {
            return Ok(false);
        };

        let js = format!(
            r#"(function () {{
                document.querySelectorAll('.' + {class}).forEach(function (el) {{
                    el.style.border = '';
                    el.classList.remove({class});
                }});
                var target = document.querySelector({selector});
                if (!target) return false;
                target.style.border = {border};
                target.classList.add({class});
                return true;
            }})()"#,
            class = serde_json::to_string(MARKER_CLASS)?,
            selector = serde_json::to_string(&css_path)?,
            border = serde_json::to_string(MARKER_BORDER)?,
        );

        let result = self
            .tab()?
            .evaluate(&js, false)
            .map_err(|e| CopilotError::EvaluationFailed(format!("Failed to apply marker: {}", e)))?;

        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Snapshot captured by the most recent page script run
    pub fn last_snapshot(&self) -> Option<&DomTree> {
        self.last_snapshot.as_ref()
    }

    /// Close all tabs; the browser process exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        let tabs = self.get_tabs()?;
        for tab in tabs {
            let _ = tab.close(false); // Ignore errors on individual tab closes
        }
        Ok(())
    }
}

#[async_trait]
impl PageAgent for BrowserSession {
    async fn execute(&mut self, script: &mut dyn PageScript) -> Result<ExtractedJobData> {
        let mut tree = self.capture_snapshot()?;
        let data = script.run(&mut tree);

        if let Some(path) = tree.marked_paths().into_iter().next() {
            match self.apply_marker(&tree, &path) {
                Ok(true) => log::debug!("Marked live region {:?}", path),
                Ok(false) => log::warn!("Active region {:?} could not be addressed in the live page", path),
                Err(e) => log::warn!("Failed to mark active region: {}", e),
            }
        }

        self.last_snapshot = Some(tree);
        Ok(data)
    }
}
