//! Memcached text-protocol store
//!
//! Only `get` and `set` are spoken. Values are stored with flags 0 and
//! exptime 0 (never expire).

use crate::cache::traits::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Default address of a local memcached daemon
pub const DEFAULT_MEMCACHED_ADDR: &str = "localhost:11211";

/// A single connection to a memcached server
///
/// A connection the server has dropped is reopened once per operation.
pub struct MemcachedStore {
    addr: String,
    stream: Mutex<BufStream<TcpStream>>,
}

impl MemcachedStore {
    /// Connects to a memcached server
    ///
    /// # Arguments
    ///
    /// * `addr` - `host:port` of the server
    ///
    /// # Returns
    ///
    /// * `Ok(MemcachedStore)` - Connected
    /// * `Err(CacheError::Unavailable)` - Nothing is listening at `addr`
    pub async fn connect(addr: &str) -> CacheResult<Self> {
        let stream = open_stream(addr).await?;

        Ok(Self {
            addr: addr.to_string(),
            stream: Mutex::new(stream),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn reconnect(
        &self,
        stream: &mut BufStream<TcpStream>,
        cause: &CacheError,
    ) -> CacheResult<()> {
        tracing::info!(
            "memcached connection to {} lost ({}), reconnecting",
            self.addr,
            cause
        );
        *stream = open_stream(&self.addr).await?;
        Ok(())
    }
}

async fn open_stream(addr: &str) -> CacheResult<BufStream<TcpStream>> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| CacheError::Unavailable(format!("{}: {}", addr, e)))?;
    Ok(BufStream::new(stream))
}

async fn read_line(stream: &mut BufStream<TcpStream>) -> CacheResult<String> {
    let mut line = String::new();
    let read = stream.read_line(&mut line).await?;
    if read == 0 {
        let closed = io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by server");
        return Err(closed.into());
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Parses `VALUE <key> <flags> <bytes>` into flags and byte count
fn parse_value_header(line: &str, key: &str) -> CacheResult<(u32, usize)> {
    let parts: Vec<&str> = line.split(' ').collect();
    let bad = || CacheError::Protocol(format!("bad value header '{}'", line));
    match parts.as_slice() {
        ["VALUE", k, flags, bytes] | ["VALUE", k, flags, bytes, _] if *k == key => {
            Ok((flags.parse().map_err(|_| bad())?, bytes.parse().map_err(|_| bad())?))
        }
        _ => Err(CacheError::Protocol(format!("unexpected reply '{}'", line))),
    }
}

async fn get_on(stream: &mut BufStream<TcpStream>, key: &str) -> CacheResult<Option<Vec<u8>>> {
    stream.write_all(format!("get {}\r\n", key).as_bytes()).await?;
    stream.flush().await?;

    let header = read_line(stream).await?;
    if header == "END" {
        return Ok(None);
    }

    let (flags, len) = parse_value_header(&header, key)?;

    // data block is followed by \r\n
    let mut data = vec![0u8; len + 2];
    stream.read_exact(&mut data).await?;
    data.truncate(len);

    let end = read_line(stream).await?;
    if end != "END" {
        return Err(CacheError::Protocol(format!("expected END, got '{}'", end)));
    }

    // values this crate stores always carry flags 0
    if flags != 0 {
        tracing::debug!("Ignoring {} stored with flags {}", key, flags);
        return Ok(None);
    }

    Ok(Some(data))
}

async fn set_on(stream: &mut BufStream<TcpStream>, key: &str, value: &[u8]) -> CacheResult<()> {
    stream
        .write_all(format!("set {} 0 0 {}\r\n", key, value.len()).as_bytes())
        .await?;
    stream.write_all(value).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await?;

    let reply = read_line(stream).await?;
    if reply == "STORED" {
        Ok(())
    } else {
        Err(CacheError::Protocol(format!("set {} failed: '{}'", key, reply)))
    }
}

#[async_trait]
impl CacheStore for MemcachedStore {
    fn name(&self) -> &'static str {
        "memcached"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut stream = self.stream.lock().await;

        match get_on(&mut stream, key).await {
            Err(e @ CacheError::Io(_)) => {
                self.reconnect(&mut stream, &e).await?;
                get_on(&mut stream, key).await
            }
            result => result,
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        let mut stream = self.stream.lock().await;

        match set_on(&mut stream, key, value).await {
            Err(e @ CacheError::Io(_)) => {
                self.reconnect(&mut stream, &e).await?;
                set_on(&mut stream, key, value).await
            }
            result => result,
        }
    }
}
