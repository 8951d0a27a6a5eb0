//! External-process article compiler.
//!
//! ```text
//! <cmd> compile <source> --root <root> --output <out> [--watch]   → JSON on stdout
//! <cmd> render  <source> --root <root> --output <out> [--watch]   ← PageContext JSON on stdin
//! ```
//!
//! The compile output is decoded by [`super::wire`]. Pages marked
//! `{"$function": true}` are rendered by a second `render` call once the
//! site index exists.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;

use super::{ArticleCompiler, BuildContext, Compiled, Program, SourceKind, wire};
use crate::log;
use crate::site::Page;

/// Runs the configured command for every source file.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    command: Arc<[String]>,
}

impl CommandCompiler {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl ArticleCompiler for CommandCompiler {
    fn load(&self, path: &Path, context: &BuildContext) -> Result<Arc<dyn Program>> {
        let kind = SourceKind::of(path, &context.extension)
            .with_context(|| format!("Not a source file: {}", path.display()))?;
        Ok(Arc::new(CommandProgram {
            invocation: Arc::new(Invocation::new(&self.command, path, context)),
            kind,
        }))
    }
}

/// Command line shared by the compile and render calls of one source.
#[derive(Debug)]
struct Invocation {
    command: Arc<[String]>,
    root: PathBuf,
    source: PathBuf,
    args: Vec<OsString>,
}

impl Invocation {
    fn new(command: &Arc<[String]>, source: &Path, context: &BuildContext) -> Self {
        let mut args: Vec<OsString> = vec![
            source.into(),
            "--root".into(),
            context.root.as_os_str().into(),
            "--output".into(),
            context.output.as_os_str().into(),
        ];
        if context.watch {
            args.push("--watch".into());
        }
        Self {
            command: Arc::clone(command),
            root: context.root.clone(),
            source: source.to_path_buf(),
            args,
        }
    }

    fn call(&self, action: &str, stdin: Option<&[u8]>) -> Result<Value> {
        let output = exec(&self.root, &self.command, action, &self.args, stdin)?;
        serde_json::from_slice(&output.stdout).with_context(|| {
            format!(
                "`{action}` output for {} is not valid JSON",
                self.source.display()
            )
        })
    }
}

struct CommandProgram {
    invocation: Arc<Invocation>,
    kind: SourceKind,
}

impl Program for CommandProgram {
    fn run(&self) -> Result<Compiled> {
        let value = self.invocation.call("compile", None)?;
        let invocation = Arc::clone(&self.invocation);
        wire::decode_compiled(self.kind, &value, move || {
            Page::dynamic(move |context| {
                let input = context.to_json()?;
                let value = invocation.call("render", Some(input.as_bytes()))?;
                wire::decode_node(&value)
            })
        })
    }
}

// ============================================================================
// Process execution
// ============================================================================

/// Run `cmd action args..` in `root`, feeding `stdin` if given.
///
/// Non-zero exit status becomes an error carrying stderr. On success,
/// stderr lines are logged under the program name.
fn exec(
    root: &Path,
    cmd: &[String],
    action: &str,
    args: &[OsString],
    stdin: Option<&[u8]>,
) -> Result<Output> {
    let (name, rest) = cmd.split_first().context("Empty compiler command")?;

    let mut command = Command::new(name);
    command
        .args(rest)
        .arg(action)
        .args(args)
        .current_dir(root)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    // Feed stdin from a separate thread so a chatty child cannot fill its
    // stdout pipe while we are still writing.
    let output = std::thread::scope(|scope| -> Result<Output> {
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => Some(scope.spawn(move || pipe.write_all(input))),
            _ => None,
        };
        let output = child
            .wait_with_output()
            .with_context(|| format!("`{name}` process failed"))?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| anyhow!("Failed to join stdin writer for `{name}`"))?
                .with_context(|| format!("Failed to write stdin of `{name}`"))?;
        }
        Ok(output)
    })?;

    if !output.status.success() {
        bail!(format_error(name, &output));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        log!(name; "{}", stderr);
    }

    Ok(output)
}

fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut msg = format!("Command `{name}` failed with {}", output.status);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        msg.push('\n');
        msg.push_str(stderr);
    }
    msg
}
