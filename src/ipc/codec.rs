//! Frame codec
//!
//! Reads and writes one length-prefixed JSON frame on any async byte
//! stream. Nothing is buffered beyond the frame being handled, and a read
//! never consumes bytes past the declared length.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{GreeterError, Result};

/// Largest payload accepted on decode; greetd responses are always small
pub const MAX_PAYLOAD_LENGTH: u32 = 4 * 1024;

const LENGTH_PREFIX_SIZE: usize = std::mem::size_of::<u32>();

/// Serialize `message` and write it as one frame, then flush
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let payload = serde_json::to_vec(message).map_err(GreeterError::Encode)?;
    let length =
        u32::try_from(payload.len()).map_err(|_| GreeterError::PayloadTooLong(payload.len()))?;

    trace!("Writing frame: {} byte payload", length);

    writer.write_all(&length.to_ne_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;

    Ok(())
}

/// Read one frame and parse its payload as `T`
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut length_buf = [0u8; LENGTH_PREFIX_SIZE];
    read_exact(reader, &mut length_buf).await?;

    let length = u32::from_ne_bytes(length_buf);
    if length > MAX_PAYLOAD_LENGTH {
        return Err(GreeterError::FrameTooLarge {
            length,
            max: MAX_PAYLOAD_LENGTH,
        });
    }

    trace!("Reading frame: {} byte payload", length);

    let mut payload = vec![0u8; length as usize];
    read_exact(reader, &mut payload).await?;

    serde_json::from_slice(&payload).map_err(GreeterError::Decode)
}

async fn read_exact<R>(reader: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(GreeterError::ConnectionClosed)
        }
        Err(e) => Err(GreeterError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::{AuthMessageKind, ErrorKind, Request, Response};
    use proptest::prelude::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = (payload.len() as u32).to_ne_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[tokio::test]
    async fn test_frame_over_duplex() {
        let (mut client, mut daemon) = tokio::io::duplex(1024);

        let request = Request::start_session("niri-session", vec!["LANG=C".into()]);
        write_frame(&mut client, &request).await.unwrap();

        let received: Request = read_frame(&mut daemon).await.unwrap();
        assert_eq!(received, request);
    }

    #[tokio::test]
    async fn test_length_prefix_is_native_order() {
        let mut out = Vec::new();
        write_frame(&mut out, &Response::Success).await.unwrap();

        let payload = br#"{"type":"success"}"#;
        assert_eq!(&out[..4], &(payload.len() as u32).to_ne_bytes());
        assert_eq!(&out[4..], payload);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected_without_reading_body() {
        let body = vec![b' '; 4097];
        let data = frame(&body);

        let mut reader: &[u8] = &data;
        let err = read_frame::<_, Response>(&mut reader).await.unwrap_err();

        assert!(matches!(
            err,
            GreeterError::FrameTooLarge {
                length: 4097,
                max: MAX_PAYLOAD_LENGTH
            }
        ));
        assert_eq!(reader.len(), body.len());
    }

    #[tokio::test]
    async fn test_frame_at_ceiling_accepted() {
        let prefix = r#"{"type":"auth_message","auth_message_type":"info","auth_message":""#;
        let suffix = r#""}"#;
        let filler = "x".repeat(MAX_PAYLOAD_LENGTH as usize - prefix.len() - suffix.len());
        let payload = format!("{prefix}{filler}{suffix}");
        assert_eq!(payload.len(), MAX_PAYLOAD_LENGTH as usize);

        let data = frame(payload.as_bytes());
        let mut reader: &[u8] = &data;
        let resp: Response = read_frame(&mut reader).await.unwrap();

        assert!(matches!(
            resp,
            Response::AuthMessage {
                auth_message_type: AuthMessageKind::Info,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_short_read_is_connection_closed() {
        let mut data = 10u32.to_ne_bytes().to_vec();
        data.extend_from_slice(b"{\"ty");
        let mut reader: &[u8] = &data;
        let err = read_frame::<_, Response>(&mut reader).await.unwrap_err();
        assert!(matches!(err, GreeterError::ConnectionClosed));

        let mut reader: &[u8] = &[0x01, 0x00];
        let err = read_frame::<_, Response>(&mut reader).await.unwrap_err();
        assert!(matches!(err, GreeterError::ConnectionClosed));

        let mut reader: &[u8] = &[];
        let err = read_frame::<_, Response>(&mut reader).await.unwrap_err();
        assert!(matches!(err, GreeterError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_decode_error() {
        let data = frame(b"{not json");
        let mut reader: &[u8] = &data;
        let err = read_frame::<_, Response>(&mut reader).await.unwrap_err();
        assert!(matches!(err, GreeterError::Decode(_)));

        let data = frame(br#"{"type":"error","error_type":"fatal","description":"x"}"#);
        let mut reader: &[u8] = &data;
        let err = read_frame::<_, Response>(&mut reader).await.unwrap_err();
        assert!(matches!(err, GreeterError::Decode(_)));
    }

    #[tokio::test]
    async fn test_reads_stop_at_frame_boundary() {
        let mut data = Vec::new();
        write_frame(&mut data, &Response::Success).await.unwrap();
        write_frame(
            &mut data,
            &Response::Error {
                error_type: ErrorKind::Error,
                description: "session exists".into(),
            },
        )
        .await
        .unwrap();

        let mut reader: &[u8] = &data;
        let first: Response = read_frame(&mut reader).await.unwrap();
        assert_eq!(first, Response::Success);

        let second: Response = read_frame(&mut reader).await.unwrap();
        assert_eq!(second.tag(), "error");
        assert!(reader.is_empty());
    }

    proptest! {
        #[test]
        fn prop_frames_survive_arbitrary_text(username in ".{0,256}", prompt in ".{0,256}") {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let request = Request::CreateSession { username: username.clone() };
                let response = Response::AuthMessage {
                    auth_message_type: AuthMessageKind::Visible,
                    auth_message: prompt.clone(),
                };

                let mut data = Vec::new();
                write_frame(&mut data, &request).await.unwrap();
                write_frame(&mut data, &response).await.unwrap();

                let mut reader: &[u8] = &data;
                let req_back: Request = read_frame(&mut reader).await.unwrap();
                let resp_back: Response = read_frame(&mut reader).await.unwrap();
                assert_eq!(req_back, request);
                assert_eq!(resp_back, response);
            });
        }
    }
}
