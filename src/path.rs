// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for files that lesson-mirror reads but
//! does not own.

use std::path::PathBuf;

/// Determine default absolute path to mirror configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/lesson-mirror/config.toml`
/// as the default. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoConfigDir`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("lesson-mirror").join("config.toml"))
        .ok_or(NoConfigDir)
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoConfigDir;

/// Friendly result alias :3
pub type Result<T, E = NoConfigDir> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;

    #[cfg(target_os = "linux")]
    #[sealed_test(env = [("XDG_CONFIG_HOME", "/home/blah/.config")])]
    fn default_config_path_follows_xdg() -> anyhow::Result<()> {
        let path = default_config_path()?;
        assert_eq!(path, PathBuf::from("/home/blah/.config/lesson-mirror/config.toml"));

        Ok(())
    }
}
