//! Where colectivo keeps its files and how it finds mpv.
//!
//! `COLECTIVO_CONFIG_DIR` / `COLECTIVO_DATA_DIR` override the per-user
//! locations.

use std::path::PathBuf;

const APP_DIR: &str = "colectivo";

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Logs and the mpv stderr capture.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = env_dir("COLECTIVO_DATA_DIR") {
        return dir;
    }
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

/// `config.toml` and the optional station catalog files.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = env_dir("COLECTIVO_CONFIG_DIR") {
        return dir;
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// IPC endpoint name for this process's mpv.  Includes the pid so two
/// running instances never share a socket.
pub fn mpv_socket_name() -> String {
    let name = format!("colectivo-mpv-{}", std::process::id());
    if cfg!(windows) {
        name
    } else {
        std::env::temp_dir()
            .join(format!("{}.sock", name))
            .display()
            .to_string()
    }
}

pub fn mpv_socket_arg() -> String {
    if cfg!(windows) {
        format!("--input-ipc-server=\\\\.\\pipe\\{}", mpv_socket_name())
    } else {
        format!("--input-ipc-server={}", mpv_socket_name())
    }
}

fn mpv_binary_name() -> &'static str {
    if cfg!(windows) {
        "mpv.exe"
    } else {
        "mpv"
    }
}

/// `MPV_PATH` first, then next to our own executable, then `PATH`.
pub fn find_mpv_binary() -> Option<PathBuf> {
    let name = mpv_binary_name();
    let from_env = env_dir("MPV_PATH");
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(name)));
    let on_path = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).map(|dir| dir.join(name)).collect())
        .unwrap_or_else(Vec::new);

    from_env
        .into_iter()
        .chain(beside_exe)
        .chain(on_path)
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_is_per_process() {
        let name = mpv_socket_name();
        assert!(name.contains(&std::process::id().to_string()));
        assert!(mpv_socket_arg().ends_with(&name));
    }

    #[test]
    fn test_dirs_are_namespaced() {
        if std::env::var_os("COLECTIVO_DATA_DIR").is_none() {
            assert!(data_dir().ends_with(APP_DIR));
        }
        if std::env::var_os("COLECTIVO_CONFIG_DIR").is_none() {
            assert!(config_dir().ends_with(APP_DIR));
        }
    }
}
