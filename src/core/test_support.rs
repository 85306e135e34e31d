// Minimal HTTP/1.1 responder on a loopback socket for network-path tests.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Status line plus the whole body at once.
    Full { status: u16, body: Vec<u8> },
    /// Body sent in pieces with a pause before each one.
    Trickle { chunks: Vec<Vec<u8>>, delay: Duration },
    /// Announces `total_len` bytes, sends `prefix`, then hangs.
    Stall { prefix: Vec<u8>, total_len: usize },
    /// Reads the request and never answers.
    Silent,
}

/// Serve `reply` to every connection; returns the base URL (`http://127.0.0.1:<port>`).
pub(crate) async fn serve(reply: Reply) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let reply = reply.clone();
            tokio::spawn(async move {
                let _ = respond(stream, reply).await;
            });
        }
    });

    format!("http://{addr}")
}

async fn respond(mut stream: TcpStream, reply: Reply) -> std::io::Result<()> {
    read_request_head(&mut stream).await?;

    match reply {
        Reply::Full { status, body } => {
            stream.write_all(head(status, body.len()).as_bytes()).await?;
            stream.write_all(&body).await?;
        }
        Reply::Trickle { chunks, delay } => {
            let total = chunks.iter().map(Vec::len).sum();
            stream.write_all(head(200, total).as_bytes()).await?;
            stream.flush().await?;
            for chunk in chunks {
                tokio::time::sleep(delay).await;
                stream.write_all(&chunk).await?;
                stream.flush().await?;
            }
        }
        Reply::Stall { prefix, total_len } => {
            stream.write_all(head(200, total_len).as_bytes()).await?;
            stream.write_all(&prefix).await?;
            stream.flush().await?;
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Reply::Silent => {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }

    stream.shutdown().await
}

async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..read]);
    }
    Ok(())
}

fn head(status: u16, len: usize) -> String {
    format!("HTTP/1.1 {status} Test\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n")
}

/// A small zip with `mods/gecco.jar` and `options.txt`.
pub(crate) fn zip_bytes() -> Vec<u8> {
    use std::io::Write;

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("mods/gecco.jar", options).unwrap();
    writer.write_all(b"jar bytes").unwrap();
    writer.start_file("options.txt", options).unwrap();
    writer.write_all(b"fov:90").unwrap();
    writer.finish().unwrap().into_inner()
}
