use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_SCPI_PORT;
use crate::instrument::InstrumentError;

/// Network address of an analyzer's raw SCPI socket.
///
/// Accepts the VISA forms `TCPIP0::host::5025::SOCKET` and `TCPIP::host::INSTR`
/// (reached through the raw socket port) as well as a bare `host[:port]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Resource {
    type Err = InstrumentError;

    fn from_str(text: &str) -> Result<Resource, InstrumentError> {
        let text = text.trim();
        let unsupported = || InstrumentError::UnsupportedResource(text.to_string());

        if text.contains("::") {
            let parts: Vec<&str> = text.split("::").collect();
            let interface = parts[0].to_ascii_uppercase();
            if !interface.starts_with("TCPIP")
                || !interface[5..].chars().all(|c| c.is_ascii_digit())
            {
                return Err(unsupported());
            }
            let host = match parts.get(1) {
                Some(host) if !host.is_empty() => host.to_string(),
                _ => return Err(unsupported()),
            };
            return match parts[2..] {
                [port, class] if class.eq_ignore_ascii_case("SOCKET") => Ok(Resource {
                    host,
                    port: port.parse().map_err(|_| unsupported())?,
                }),
                [class] if class.eq_ignore_ascii_case("INSTR") => Ok(Resource {
                    host,
                    port: DEFAULT_SCPI_PORT,
                }),
                [] => Ok(Resource {
                    host,
                    port: DEFAULT_SCPI_PORT,
                }),
                _ => Err(unsupported()),
            };
        }

        if text.is_empty() || text.contains(char::is_whitespace) {
            return Err(unsupported());
        }
        match text.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => Ok(Resource {
                host: host.to_string(),
                port: port.parse().map_err(|_| unsupported())?,
            }),
            // bare IPv6 literals have more than one colon
            _ => Ok(Resource {
                host: text.to_string(),
                port: DEFAULT_SCPI_PORT,
            }),
        }
    }
}
