use crate::parser::pipelines::{RedirectKind, Redirection};
use std::{
    fs::{File, OpenOptions},
    io,
    os::unix::fs::OpenOptionsExt,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedirectionError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path:   String,
        #[source]
        source: io::Error,
    },
}

/// The files a stage's standard streams are replaced with.
#[derive(Debug, Default)]
pub struct Redirects {
    pub stdin:  Option<File>,
    pub stdout: Option<File>,
}

fn open(redirection: &Redirection) -> io::Result<File> {
    let mut options = OpenOptions::new();
    match redirection.kind {
        RedirectKind::Output => options.write(true).create(true).truncate(true),
        RedirectKind::Append => options.append(true).create(true),
        RedirectKind::Input => options.read(true),
    };
    options.mode(0o644).open(&redirection.target)
}

/// Opens the redirections of one stage in the order they were written.
///
/// Every target is opened, so `> a > b` still truncates `a`, but only the last
/// file of each direction is kept. Descriptors are close-on-exec.
pub fn resolve(redirections: &[Redirection]) -> Result<Redirects, RedirectionError> {
    let mut redirects = Redirects::default();
    for redirection in redirections {
        let file = open(redirection).map_err(|source| RedirectionError::Open {
            path: redirection.target.clone(),
            source,
        })?;
        if redirection.kind.is_input() {
            redirects.stdin = Some(file);
        } else {
            redirects.stdout = Some(file);
        }
    }
    Ok(redirects)
}
