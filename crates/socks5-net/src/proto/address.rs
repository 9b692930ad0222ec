use byteorder::{BigEndian, ByteOrder};
use std::net::{Ipv4Addr, SocketAddrV4};

/// The SOCKS5 command requested by a client.
///
/// CMD=0x01 (CONNECT) is the only command this network serves; BIND
/// and UDP ASSOCIATE are Non-goals (§6), so `from_byte` treats them the
/// same as any other unsupported byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
}

impl Command {
    pub(crate) fn from_byte(b: u8) -> Option<Command> {
        match b {
            1 => Some(Command::Connect),
            _ => None,
        }
    }
}

/// A request/reply address, restricted to the ATYP subset this network
/// speaks: IPv4 and domain names on requests, IPv4 only on replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Ipv4(Ipv4Addr),
    Domain(String),
}

impl Address {
    /// Renders a `[05, 00, 00, 01, BND.ADDR(4), BND.PORT(2)]`-shaped
    /// success reply bound to `addr`, or the equivalent failure reply
    /// when `reply != 0x00`. Reply ATYP is always IPv4 (0x01) per §6.
    pub(crate) fn encode_reply(reply: u8, addr: SocketAddrV4) -> [u8; 10] {
        let mut buf = [0u8; 10];
        buf[0] = 0x05;
        buf[1] = reply;
        buf[2] = 0x00;
        buf[3] = 0x01;
        BigEndian::write_u32(&mut buf[4..8], (*addr.ip()).into());
        BigEndian::write_u16(&mut buf[8..10], addr.port());
        buf
    }
}
