use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::backend::BatchBackend;
use crate::foundation::color::Color;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::ops::{Fit, OpTag, Operation};

const BACKEND: &str = "magick";

/// Executable found by the first successful PATH probe.
static DISCOVERED: OnceLock<PathBuf> = OnceLock::new();

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagickOpts {
    /// Explicit executable; `None` probes `magick` then legacy `convert` on PATH.
    pub binary: Option<PathBuf>,
    pub timeout_ms: u64,
    pub max_output_bytes: u64,
}

impl Default for MagickOpts {
    fn default() -> Self {
        Self {
            binary: None,
            timeout_ms: 30_000,
            max_output_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Batch backend driving an ImageMagick executable, one process per operation run.
#[derive(Debug, Default)]
pub struct MagickBackend {
    opts: MagickOpts,
    explicit_ok: OnceLock<bool>,
}

impl MagickBackend {
    pub fn new(opts: MagickOpts) -> Self {
        Self {
            opts,
            explicit_ok: OnceLock::new(),
        }
    }

    pub fn opts(&self) -> &MagickOpts {
        &self.opts
    }

    /// Tags this backend translates into command-line arguments.
    pub fn handles(tag: OpTag) -> bool {
        !matches!(
            tag,
            OpTag::Crop | OpTag::RegionBlur | OpTag::Overlay | OpTag::Group
        )
    }

    fn executable(&self) -> Option<PathBuf> {
        match &self.opts.binary {
            Some(path) => (*self.explicit_ok.get_or_init(|| probe(path))).then(|| path.clone()),
            None => discover(),
        }
    }

    fn run(&self, exe: &Path, png: &[u8], args: &[String]) -> TesseraResult<Vec<u8>> {
        use anyhow::Context as _;

        let dir = tempfile::Builder::new()
            .prefix("tessera-magick-")
            .tempdir()
            .context("failed to create batch working directory")?;
        let input = dir.path().join("input.png");
        let output = dir.path().join("output.png");
        std::fs::write(&input, png)
            .with_context(|| format!("failed to write batch input '{}'", input.display()))?;

        let mut cmd = Command::new(exe);
        cmd.arg(&input)
            .args(args)
            .arg(format!("PNG32:{}", output.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        tracing::debug!(exe = %exe.display(), args = args.len(), "spawning batch process");
        let mut child = cmd.spawn().map_err(|e| {
            TesseraError::backend(
                BACKEND,
                format!("failed to spawn '{}': {e}", exe.display()),
            )
        })?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TesseraError::backend(BACKEND, "failed to open stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok::<_, std::io::Error>(stderr_bytes)
        });

        let timeout = Duration::from_millis(self.opts.timeout_ms);
        let status = match wait_with_timeout(&mut child, timeout)? {
            Some(status) => status,
            None => {
                return Err(TesseraError::BackendTimeout {
                    backend: BACKEND.to_owned(),
                    after_ms: self.opts.timeout_ms,
                });
            }
        };
        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| TesseraError::backend(BACKEND, "stderr drain thread panicked"))?
            .map_err(|e| TesseraError::backend(BACKEND, format!("stderr read failed: {e}")))?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(TesseraError::backend(
                BACKEND,
                format!("exited with status {status}: {}", stderr.trim()),
            ));
        }

        let len = std::fs::metadata(&output)
            .map_err(|e| TesseraError::backend(BACKEND, format!("no output produced: {e}")))?
            .len();
        if len > self.opts.max_output_bytes {
            return Err(TesseraError::backend(
                BACKEND,
                format!(
                    "output of {len} bytes exceeds the {} byte cap",
                    self.opts.max_output_bytes
                ),
            ));
        }
        let bytes = std::fs::read(&output)
            .with_context(|| format!("failed to read batch output '{}'", output.display()))?;
        Ok(bytes)
    }
}

impl BatchBackend for MagickBackend {
    fn name(&self) -> &str {
        BACKEND
    }

    fn supports(&self, tag: OpTag) -> bool {
        Self::handles(tag)
    }

    fn is_available(&self) -> bool {
        self.executable().is_some()
    }

    #[tracing::instrument(skip_all, fields(ops = ops.len(), input_bytes = png.len()))]
    fn apply_batch(&self, png: &[u8], ops: &[Operation]) -> TesseraResult<Vec<u8>> {
        let exe = self
            .executable()
            .ok_or_else(|| TesseraError::backend(BACKEND, "no ImageMagick executable found"))?;
        let mut args = Vec::new();
        for op in ops {
            args.extend(magick_args(op)?);
        }
        self.run(&exe, png, &args)
    }
}

/// Poll until the child exits; kills it and returns `None` once `timeout` elapses.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> TesseraResult<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) if started.elapsed() >= timeout => {
                abandon(child);
                return Ok(None);
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(5)),
            Err(e) => {
                abandon(child);
                return Err(TesseraError::backend(
                    BACKEND,
                    format!("failed to wait for process: {e}"),
                ));
            }
        }
    }
}

/// Kill and reap a child we are giving up on. Errors are moot at this point.
fn abandon(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn probe(exe: &Path) -> bool {
    Command::new(exe)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn discover() -> Option<PathBuf> {
    if let Some(found) = DISCOVERED.get() {
        return Some(found.clone());
    }
    let found = ["magick", "convert"]
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| probe(candidate))?;
    tracing::debug!(exe = %found.display(), "discovered ImageMagick");
    Some(DISCOVERED.get_or_init(|| found).clone())
}

/// `true` if an ImageMagick executable is reachable on PATH.
pub fn is_magick_on_path() -> bool {
    discover().is_some()
}

fn color_arg(c: Color) -> String {
    format!("rgba({},{},{},{})", c.r, c.g, c.b, c.a)
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// ImageMagick arguments for one operation.
pub fn magick_args(op: &Operation) -> TesseraResult<Vec<String>> {
    fn a<const N: usize>(parts: [String; N]) -> Vec<String> {
        parts.into()
    }
    let s = |v: &str| v.to_owned();

    Ok(match op {
        Operation::Resize(p) => {
            let geometry = match (p.width, p.height) {
                (Some(w), Some(h)) => format!("{w}x{h}"),
                (Some(w), None) => format!("{w}"),
                (None, Some(h)) => format!("x{h}"),
                (None, None) => {
                    return Err(TesseraError::validation("resize", "width or height is required"));
                }
            };
            let mut args = a([s("-filter"), s(p.filter.magick_name())]);
            let both = p.width.is_some() && p.height.is_some();
            match p.fit {
                Fit::Fill if both => args.extend([s("-resize"), format!("{geometry}!")]),
                Fit::Cover if both => args.extend([
                    s("-resize"),
                    format!("{geometry}^"),
                    s("-gravity"),
                    s("center"),
                    s("-extent"),
                    geometry,
                ]),
                Fit::Contain if both => args.extend([
                    s("-resize"),
                    geometry.clone(),
                    s("-background"),
                    color_arg(p.background),
                    s("-gravity"),
                    s("center"),
                    s("-extent"),
                    geometry,
                ]),
                _ => args.extend([s("-resize"), geometry]),
            }
            args
        }
        Operation::Rotate(p) => a([
            s("-background"),
            color_arg(p.background),
            s("-rotate"),
            fmt_num(p.degrees),
        ]),
        Operation::Flip => a([s("-flip")]),
        Operation::Flop => a([s("-flop")]),
        Operation::Roll(p) => a([s("-roll"), format!("{:+}{:+}", p.x, p.y)]),
        Operation::Distort(p) => {
            let flag = if p.bestfit { "+distort" } else { "-distort" };
            let args: Vec<String> = p.args.iter().map(|v| fmt_num(*v)).collect();
            a([s(flag), s(p.method.magick_name()), args.join(" ")])
        }
        Operation::Grayscale => a([s("-colorspace"), s("Gray")]),
        Operation::Negate => a([s("-channel"), s("RGB"), s("-negate"), s("+channel")]),
        Operation::Normalize => a([s("-normalize")]),
        Operation::Equalize => a([s("-equalize")]),
        Operation::AutoLevel => a([s("-auto-level")]),
        Operation::AutoGamma => a([s("-auto-gamma")]),
        Operation::Gamma(p) => a([s("-gamma"), fmt_num(p.value)]),
        Operation::Level(p) => a([
            s("-level"),
            format!("{}%,{}%,{}", fmt_num(p.black), fmt_num(p.white), fmt_num(p.gamma)),
        ]),
        Operation::LinearStretch(p) => a([
            s("-linear-stretch"),
            format!("{}%x{}%", fmt_num(p.black), fmt_num(p.white)),
        ]),
        Operation::Contrast(p) => {
            a([s("-brightness-contrast"), format!("0x{}", fmt_num(p.amount))])
        }
        Operation::Posterize(p) => a([s("-posterize"), p.levels.to_string()]),
        Operation::Sepia(p) => a([s("-sepia-tone"), format!("{}%", fmt_num(p.threshold))]),
        Operation::Tint(p) => a([
            s("-fill"),
            color_arg(p.color),
            s("-tint"),
            fmt_num(p.amount),
        ]),
        Operation::Colorize(p) => a([
            s("-fill"),
            color_arg(p.color),
            s("-colorize"),
            format!("{}%", fmt_num(p.amount)),
        ]),
        Operation::Threshold(p) => a([s("-threshold"), format!("{}%", fmt_num(p.percent))]),
        Operation::Quantize(p) => {
            let dither = if p.dither {
                a([s("-dither"), s("FloydSteinberg")])
            } else {
                a([s("+dither")])
            };
            let mut args = dither;
            args.extend([s("-colors"), p.colors.to_string()]);
            args
        }
        Operation::Segment(p) => a([
            s("-segment"),
            format!("{}x{}", fmt_num(p.cluster_threshold), fmt_num(p.smoothing)),
        ]),
        Operation::Sharpen(p) => a([s("-sharpen"), format!("0x{}", fmt_num(p.sigma))]),
        Operation::Blur(p) => a([s("-blur"), format!("0x{}", fmt_num(p.sigma))]),
        Operation::MotionBlur(p) => a([
            s("-motion-blur"),
            format!("{}x{}+{}", fmt_num(p.radius), fmt_num(p.sigma), fmt_num(p.angle)),
        ]),
        Operation::RotationalBlur(p) => a([s("-rotational-blur"), fmt_num(p.angle)]),
        Operation::Noise(p) => a([
            s("-seed"),
            p.seed.to_string(),
            s("-attenuate"),
            fmt_num(p.attenuate),
            s("+noise"),
            s(p.kind.magick_name()),
        ]),
        Operation::Despeckle => a([s("-despeckle")]),
        Operation::Denoise(p) => a([s("-wavelet-denoise"), format!("{}%", fmt_num(p.threshold))]),
        Operation::Charcoal(p) => a([
            s("-charcoal"),
            format!("{}x{}", fmt_num(p.radius), fmt_num(p.sigma)),
        ]),
        Operation::Sketch(p) => a([
            s("-sketch"),
            format!("{}x{}+{}", fmt_num(p.radius), fmt_num(p.sigma), fmt_num(p.angle)),
        ]),
        Operation::OilPaint(p) => a([s("-paint"), fmt_num(p.radius)]),
        Operation::Emboss(p) => a([
            s("-emboss"),
            format!("{}x{}", fmt_num(p.radius), fmt_num(p.sigma)),
        ]),
        Operation::Edge(p) => a([s("-edge"), fmt_num(p.radius)]),
        Operation::Solarize(p) => a([s("-solarize"), format!("{}%", fmt_num(p.threshold))]),
        Operation::Swirl(p) => a([s("-swirl"), fmt_num(p.degrees)]),
        Operation::Wave(p) => a([
            s("-background"),
            s("none"),
            s("-wave"),
            format!("{}x{}", fmt_num(p.amplitude), fmt_num(p.wavelength)),
        ]),
        Operation::Implode(p) => a([s("-implode"), fmt_num(p.amount)]),
        Operation::Vignette(p) => a([
            s("-background"),
            color_arg(p.color),
            s("-vignette"),
            format!("{}x{}", fmt_num(p.radius), fmt_num(p.sigma)),
        ]),
        Operation::Border(p) => a([
            s("-bordercolor"),
            color_arg(p.color),
            s("-border"),
            p.width.to_string(),
        ]),
        Operation::Frame(p) => a([
            s("-mattecolor"),
            color_arg(p.color),
            s("-frame"),
            format!("{0}x{0}+{1}+{2}", p.width, p.outer_bevel, p.inner_bevel),
        ]),
        Operation::Crop(_)
        | Operation::RegionBlur(_)
        | Operation::Overlay(_)
        | Operation::Group(_) => {
            return Err(TesseraError::capability(op.tag().as_str()));
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/backend/magick.rs"]
mod tests;
