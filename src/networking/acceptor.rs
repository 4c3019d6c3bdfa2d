// Copyright (c) 2026
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! TCP acceptor: binds one OS-assigned listening port and accepts at most
//! one consumer connection at a time.
//!
//! The "at most one" guarantee is structural, not a separate check: the
//! supervisor loop only calls [`accept_one`] again after the previous
//! session has fully ended, so a second connection attempt simply queues
//! in the kernel's backlog until then.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};

/// Bind the listening socket on an OS-assigned port of `bind_ip`.
pub async fn bind(bind_ip: std::net::IpAddr) -> std::io::Result<TcpListener> {
    TcpListener::bind(SocketAddr::new(bind_ip, 0)).await
}

/// Accept the next consumer connection.
pub async fn accept_one(listener: &TcpListener) -> std::io::Result<(TcpStream, SocketAddr)> {
    listener.accept().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_an_os_assigned_port() {
        let listener = bind("127.0.0.1".parse().unwrap()).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn accepts_a_connecting_client() {
        let listener = bind("127.0.0.1".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });

        let (_stream, _peer) = accept_one(&listener).await.unwrap();
        client.await.unwrap();
    }
}
