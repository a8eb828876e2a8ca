//! Test support utilities for installer behavioural tests.
//!
//! Provides an in-memory Go distribution builder, a directory-backed
//! mirror that stands in for the HTTP downloader, and a loopback HTTP server
//! that serves the same directory to the real downloader.

use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use godownload_installer::artefact::download::{ArchiveDownloader, DownloadError};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

/// One entry of a generated archive.
pub enum Entry<'a> {
    /// A directory with the given mode.
    Dir(&'a str, u32),
    /// A regular file with contents and mode.
    File(&'a str, &'a [u8], u32),
}

/// Build a gzip-compressed tarball from `entries`.
pub fn tarball(entries: &[Entry<'_>]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        match entry {
            Entry::Dir(path, mode) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(*mode);
                header.set_size(0);
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .expect("append directory");
            }
            Entry::File(path, contents, mode) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(*mode);
                header.set_size(contents.len() as u64);
                builder
                    .append_data(&mut header, path, *contents)
                    .expect("append file");
            }
        }
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// A minimal Go distribution: `go/bin/go`, `go/VERSION`, and a stray file
/// outside the `go/` tree.
pub fn go_distribution(version: &str) -> Vec<u8> {
    let version_file = format!("go{version}\n");
    tarball(&[
        Entry::Dir("go/bin/", 0o755),
        Entry::File("go/bin/go", b"#!/bin/sh\nexit 0\n", 0o755),
        Entry::File("go/VERSION", version_file.as_bytes(), 0o644),
        Entry::File("README.md", b"not part of the toolchain\n", 0o644),
    ])
}

/// An archive with no `go/` tree at all.
pub fn foreign_archive() -> Vec<u8> {
    tarball(&[Entry::File("gopls/gopls", b"binary", 0o755)])
}

/// A mirror serving archives from a local directory.
///
/// URLs are resolved by their last path segment; unknown archives yield
/// [`DownloadError::NotFound`]. Every requested URL is recorded.
pub struct DirectoryMirror {
    root: Utf8PathBuf,
    requested: RefCell<Vec<String>>,
}

impl DirectoryMirror {
    /// Serve files placed under `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            requested: RefCell::new(Vec::new()),
        }
    }

    /// Publish `contents` under `name`.
    pub fn publish(&self, name: &str, contents: &[u8]) {
        std::fs::create_dir_all(&self.root).expect("create mirror root");
        std::fs::write(self.root.join(name), contents).expect("publish archive");
    }

    /// URLs requested so far.
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }

    /// Directory the archives are published under.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl ArchiveDownloader for DirectoryMirror {
    fn download(&self, url: &str, dest: &Utf8Path) -> Result<(), DownloadError> {
        self.requested.borrow_mut().push(url.to_owned());
        let name = url.rsplit('/').next().unwrap_or(url);
        let source = self.root.join(name);
        if !source.is_file() {
            return Err(DownloadError::NotFound {
                url: url.to_owned(),
            });
        }
        std::fs::copy(&source, dest).map_err(|err| DownloadError::Write {
            url: url.to_owned(),
            path: dest.to_owned(),
            source: err,
        })?;
        Ok(())
    }
}

#[derive(Default)]
struct ServerState {
    requested: Vec<String>,
    statuses: BTreeMap<String, u16>,
}

/// An HTTP/1.1 server on 127.0.0.1 serving files from a directory.
///
/// `GET {base}/{name}` answers with the bytes of `{root}/{name}`, or 404 when
/// the file is missing. Each connection carries one request and is closed
/// after the response. The accept loop runs on a detached thread for the rest
/// of the test process.
pub struct ArchiveServer {
    base_url: String,
    state: Arc<Mutex<ServerState>>,
}

impl ArchiveServer {
    /// Bind an ephemeral port and start serving `root` under `/golang`.
    pub fn start(root: impl Into<Utf8PathBuf>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind archive server");
        let address = listener.local_addr().expect("archive server address");
        let root = root.into();
        let state = Arc::new(Mutex::new(ServerState::default()));
        let shared = Arc::clone(&state);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => serve(stream, &root, &shared),
                    Err(_) => break,
                }
            }
        });
        Self {
            base_url: format!("http://{address}/golang"),
            state,
        }
    }

    /// Base URL to hand to the pipeline as the mirror.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Answer requests for `name` with `status` and an empty body.
    pub fn respond_with_status(&self, name: &str, status: u16) {
        self.state
            .lock()
            .expect("server state")
            .statuses
            .insert(name.to_owned(), status);
    }

    /// Request paths received so far.
    pub fn requested(&self) -> Vec<String> {
        self.state.lock().expect("server state").requested.clone()
    }
}

fn serve(stream: TcpStream, root: &Utf8Path, state: &Mutex<ServerState>) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) | Err(_) => break,
            Ok(_) if header.trim().is_empty() => break,
            Ok(_) => {}
        }
    }

    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_owned();
    let name = path.rsplit('/').next().unwrap_or_default().to_owned();
    let forced = {
        let mut state = state.lock().expect("server state");
        state.requested.push(path);
        state.statuses.get(&name).copied()
    };

    let (status, body) = match forced {
        Some(status) => (status, Vec::new()),
        None => std::fs::read(root.join(&name)).map_or((404, Vec::new()), |body| (200, body)),
    };
    respond(stream, status, &body);
}

fn respond(mut stream: TcpStream, status: u16, body: &[u8]) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/gzip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    if stream.write_all(head.as_bytes()).is_ok() && stream.write_all(body).is_ok() {
        stream.flush().ok();
    }
}

/// Convert a temp dir path into a UTF-8 path.
pub fn utf8(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf-8 path")
}
