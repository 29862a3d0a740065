//! Mapping of archive members to filesystem destinations.

use crate::collector::{CONFIG_PREFIX, SESSIONS_PREFIX};
use openclaw_core::OpenClawPaths;
use std::path::{Component, Path, PathBuf};

/// Where a member goes, or why it cannot be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreTarget {
    /// Write the member to this path
    Write(PathBuf),

    /// The member's root is unknown on this machine
    Unresolved(String),

    /// The member path would escape its root
    Unsafe(String),
}

/// Relative path of `member` below `prefix/`, if it lives there.
fn below<'a>(member: &'a str, prefix: &str) -> Option<&'a str> {
    member
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
}

/// True when every component of `relative` is a plain name.
fn is_contained(relative: &str) -> bool {
    let path = Path::new(relative);
    !relative.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Resolves the destination of one archive member.
///
/// `sessions/…` goes under the sessions directory, `config/…` under the home
/// configuration directory, and everything else under the project base.
pub fn resolve_target(member: &str, paths: &OpenClawPaths) -> RestoreTarget {
    if !is_contained(member) {
        return RestoreTarget::Unsafe(format!("{} escapes the restore root", member));
    }

    if let Some(rest) = below(member, SESSIONS_PREFIX) {
        return match &paths.sessions_dir {
            Some(dir) => RestoreTarget::Write(dir.join(rest)),
            None => RestoreTarget::Unresolved(format!(
                "{}: no sessions directory to restore into",
                member
            )),
        };
    }

    if let Some(rest) = below(member, CONFIG_PREFIX) {
        return RestoreTarget::Write(paths.openclaw_dir.join(rest));
    }

    RestoreTarget::Write(paths.base_dir.join(member))
}
