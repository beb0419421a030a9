// Licensed under the Apache-2.0 license

//! Generate documentation and code from register specifications.

use anyhow::{Context, Result};
use regspec_generator::{
    load_file, BundleConfig, ConstantReport, DocStyle, Emitter, GetterConfig, ValidatedGroup,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

static HEADER_LICENSE: &str = "Licensed under the Apache-2.0 license.";

/// What to generate, and where.
#[derive(Debug, Default)]
pub struct Options {
    pub specs: Vec<PathBuf>,
    /// Detail blocks written after the index.
    pub doc: Option<DocStyle>,
    /// Documentation stream. Stdout if not set.
    pub output: Option<PathBuf>,
    pub definitions: Option<PathBuf>,
    pub cheader: Option<PathBuf>,
    /// Header and implementation files of the context getters.
    pub getters: Option<(PathBuf, PathBuf)>,
    pub getter_config: GetterConfig,
    pub chisel: Option<PathBuf>,
    pub bundle_config: BundleConfig,
    /// Render every artifact without writing any of them.
    pub check: bool,
}

#[derive(Clone, Copy, Debug)]
enum Comment {
    Tex,
    C,
}

/// One output stream and the emitters writing to it.
struct Artifact {
    path: Option<PathBuf>,
    comment: Comment,
    emitters: Vec<Emitter>,
}

impl Artifact {
    fn new(path: &Path, comment: Comment, emitter: Emitter) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            comment,
            emitters: vec![emitter],
        }
    }

    fn name(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "<stdout>".to_string(), |p| p.display().to_string())
    }
}

fn artifacts(options: &Options) -> Vec<Artifact> {
    let mut documentation = vec![Emitter::Index];
    if let Some(style) = options.doc {
        documentation.push(Emitter::Documentation(style));
    }
    let mut artifacts = vec![Artifact {
        path: options.output.clone(),
        comment: Comment::Tex,
        emitters: documentation,
    }];
    if let Some(path) = &options.definitions {
        artifacts.push(Artifact::new(path, Comment::Tex, Emitter::Definitions));
    }
    if let Some(path) = &options.cheader {
        artifacts.push(Artifact::new(path, Comment::C, Emitter::Constants));
    }
    if let Some((header, implementation)) = &options.getters {
        let config = options.getter_config.clone();
        artifacts.push(Artifact::new(
            header,
            Comment::C,
            Emitter::GettersHeader(config.clone()),
        ));
        artifacts.push(Artifact::new(
            implementation,
            Comment::C,
            Emitter::GettersImpl(config),
        ));
    }
    if let Some(path) = &options.chisel {
        artifacts.push(Artifact::new(
            path,
            Comment::C,
            Emitter::Bundle(options.bundle_config.clone()),
        ));
    }
    artifacts
}

fn header(comment: Comment, specs: &[PathBuf]) -> String {
    let sources = specs
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    match comment {
        Comment::Tex => format!("% {HEADER_LICENSE}\n% Generated by xtask regs from {sources}\n\n"),
        Comment::C => {
            format!("/*\n{HEADER_LICENSE}\n\n generated by xtask regs from {sources}\n*/\n\n")
        }
    }
}

fn emit_all(
    artifact: &Artifact,
    groups: &[ValidatedGroup],
    out: &mut dyn Write,
) -> Result<ConstantReport> {
    let mut report = ConstantReport::default();
    for emitter in &artifact.emitters {
        let emitted = emitter
            .emit(groups, out)
            .with_context(|| format!("failed to generate {}", artifact.name()))?;
        report.ambiguous.extend(emitted.ambiguous);
    }
    Ok(report)
}

/// Render `artifact` into memory, with a license header if it goes to a file.
fn render(
    artifact: &Artifact,
    groups: &[ValidatedGroup],
    specs: &[PathBuf],
) -> Result<(Vec<u8>, ConstantReport)> {
    let mut buf = Vec::new();
    if artifact.path.is_some() {
        buf.extend_from_slice(header(artifact.comment, specs).as_bytes());
    }
    let report = emit_all(artifact, groups, &mut buf)?;
    Ok((buf, report))
}

fn write_artifact(artifact: &Artifact, contents: &[u8]) -> Result<()> {
    match &artifact.path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            out.write_all(contents)?;
            out.flush()
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(contents)?;
            out.flush()?;
        }
    }
    Ok(())
}

/// Load and validate every spec, then write each requested artifact.
///
/// Every artifact is rendered before the first one is written, so a failing
/// run leaves existing outputs untouched.
pub fn generate(options: &Options) -> Result<()> {
    let mut groups = Vec::new();
    for spec in &options.specs {
        let group =
            load_file(spec).with_context(|| format!("failed to load {}", spec.display()))?;
        log::info!(
            "Loaded {} ({} registers)",
            spec.display(),
            group.registers.len()
        );
        groups.push(group);
    }

    let mut suppressed = Vec::new();
    let mut rendered = Vec::new();
    for artifact in artifacts(options) {
        let (contents, report) = render(&artifact, &groups, &options.specs)?;
        suppressed.extend(report.ambiguous);
        rendered.push((artifact, contents));
    }

    for (artifact, contents) in &rendered {
        if options.check {
            log::info!("  ✓ Would generate {} ({} bytes)", artifact.name(), contents.len());
        } else {
            write_artifact(artifact, contents)?;
            log::info!("  ✓ Generated {} ({} bytes)", artifact.name(), contents.len());
        }
    }

    if !suppressed.is_empty() {
        log::warn!(
            "{} ambiguous constant names omitted: {}",
            suppressed.len(),
            suppressed.join(", ")
        );
    }
    Ok(())
}
