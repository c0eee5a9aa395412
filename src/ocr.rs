use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::model::OcrToken;
use crate::tokenizer::parse_tesseract_tsv;

pub const DEFAULT_OCR_LANG: &str = "hin";
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 120;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    pub program: String,
    pub lang: String,
    pub timeout: Duration,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            program: "tesseract".to_string(),
            lang: DEFAULT_OCR_LANG.to_string(),
            timeout: Duration::from_secs(DEFAULT_OCR_TIMEOUT_SECS),
        }
    }
}

impl TesseractOcr {
    pub fn extract_text(&self, image_path: &Path) -> Result<String> {
        let stdout = self.run(image_path, &[])?;
        let text = stdout.replace('\u{0000}', "").replace('\u{000C}', "");
        info!(
            image = %image_path.display(),
            lines = text.lines().count(),
            "ocr text extracted"
        );
        Ok(text.trim().to_string())
    }

    pub fn extract_tokens(&self, image_path: &Path) -> Result<Vec<OcrToken>> {
        let stdout = self.run(image_path, &["tsv"])?;
        let tokens = parse_tesseract_tsv(&stdout)
            .with_context(|| format!("failed to parse tesseract TSV for {}", image_path.display()))?;
        info!(image = %image_path.display(), tokens = tokens.len(), "ocr tokens extracted");
        Ok(tokens)
    }

    fn run(&self, image_path: &Path, extra_args: &[&str]) -> Result<String> {
        if !image_path.is_file() {
            bail!("image not found: {}", image_path.display());
        }

        let mut child = Command::new(&self.program)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .args(extra_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to execute {} for {}", self.program, image_path.display()))?;

        let mut stdout_pipe = child.stdout.take().context("tesseract stdout not captured")?;
        let mut stderr_pipe = child.stderr.take().context("tesseract stderr not captured")?;
        let stdout_reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout_pipe.read_to_end(&mut buf).map(|_| buf)
        });
        let stderr_reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stderr_pipe.read_to_end(&mut buf).map(|_| buf)
        });

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().context("failed to poll tesseract")? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                bail!(
                    "{} timed out after {}s on {}",
                    self.program,
                    self.timeout.as_secs(),
                    image_path.display()
                );
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = join_pipe(stdout_reader).context("failed to read tesseract stdout")?;
        let stderr = join_pipe(stderr_reader).unwrap_or_default();
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "tesseract finished");

        if !status.success() {
            bail!(
                "{} returned non-zero exit status for {}: {}",
                self.program,
                image_path.display(),
                String::from_utf8_lossy(&stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

fn join_pipe(handle: thread::JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => bail!("pipe reader thread panicked"),
    }
}
