//! Common test utilities for bigip-explode integration tests

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use flate2::{Compression, GzBuilder};
use tempfile::TempDir;

const BLOCK: usize = 512;

/// A temporary directory holding bundles and config files
pub struct TestWorkspace {
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a text file, creating parent directories
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        self.write_bytes(path, content.as_bytes())
    }

    pub fn write_bytes(&self, path: &str, content: &[u8]) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds ustar archives entry by entry
#[derive(Default)]
pub struct TarBuilder {
    data: Vec<u8>,
}

impl TarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, content: &str) -> Self {
        self.entry(name, content.as_bytes(), b'0');
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.entry(name, b"", b'5');
        self
    }

    fn entry(&mut self, name: &str, content: &[u8], typeflag: u8) {
        let mut header = [0u8; BLOCK];
        header[..name.len()].copy_from_slice(name.as_bytes());
        header[100..108].copy_from_slice(b"0000644\0");
        header[108..116].copy_from_slice(b"0000000\0");
        header[116..124].copy_from_slice(b"0000000\0");
        header[124..136].copy_from_slice(format!("{:011o}\0", content.len()).as_bytes());
        header[136..148].copy_from_slice(b"00000000000\0");
        header[156] = typeflag;
        header[257..263].copy_from_slice(b"ustar\0");
        header[263..265].copy_from_slice(b"00");
        header[148..156].copy_from_slice(b"        ");
        let sum: u32 = header.iter().map(|&b| u32::from(b)).sum();
        header[148..156].copy_from_slice(format!("{sum:06o}\0 ").as_bytes());

        self.data.extend_from_slice(&header);
        self.data.extend_from_slice(content);
        let pad = (BLOCK - content.len() % BLOCK) % BLOCK;
        self.data.resize(self.data.len() + pad, 0);
    }

    /// Uncompressed archive with its end-of-archive marker
    pub fn tar(mut self) -> Vec<u8> {
        self.data.resize(self.data.len() + BLOCK * 2, 0);
        self.data
    }

    /// Gzip-compressed archive, byte-identical across runs
    pub fn tar_gz(self) -> Vec<u8> {
        gzip(&self.tar())
    }
}

/// Gzip with a fixed header so output does not depend on the clock
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), Compression::default());
    encoder.write_all(data).expect("Failed to compress");
    encoder.finish().expect("Failed to finish gzip stream")
}

/// Command for the real bigip-explode binary, isolated from user config
#[allow(deprecated)]
pub fn bigip_cmd(workspace: &TestWorkspace) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("bigip-explode").expect("binary builds");
    cmd.env("BIGIP_EXPLODE_CONFIG_DIR", workspace.path.join("no-global-config"))
        .env_remove("BIGIP_EXPLODE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// A virtual server with a pool, a monitor and two nodes
pub const APP_CONF: &str = r##"#TMSH-VERSION: 15.1.8
ltm monitor http /Common/mon_http {
    interval 5
    send "GET /health HTTP/1.1\r\nHost: app\r\n\r\n"
}
ltm node /Common/n1 {
    address 10.0.0.1
}
ltm node /Common/n2 {
    address 10.0.0.2
}
ltm pool /Common/p1 {
    members {
        /Common/n1:80 {
            address 10.0.0.1
        }
        /Common/n2:80 {
            address 10.0.0.2
        }
    }
    monitor /Common/mon_http
}
ltm virtual /Common/vs_app {
    ip-protocol tcp
    pool /Common/p1
}
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_file_operations() {
        let workspace = TestWorkspace::new();
        workspace.write_file("config/bigip.conf", "hello");
        assert!(workspace.file_exists("config/bigip.conf"));
        assert_eq!(workspace.read_file("config/bigip.conf"), "hello");
    }

    #[test]
    fn test_tar_gz_is_deterministic() {
        let build = || TarBuilder::new().file("config/bigip.conf", APP_CONF).tar_gz();
        assert_eq!(build(), build());
    }

    #[test]
    fn test_tar_is_block_aligned() {
        let tar = TarBuilder::new().file("a", "xyz").tar();
        assert_eq!(tar.len() % BLOCK, 0);
        assert_eq!(&tar[257..262], b"ustar");
    }
}
