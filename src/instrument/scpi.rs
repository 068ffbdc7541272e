use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::instrument::{InstrumentError, InstrumentSession, Resource, SweepSettings};
use crate::spectrum::Trace;

/// Line-oriented SCPI over a byte stream, normally the analyzer's raw TCP socket.
///
/// Commands go out terminated with `\n`; every query is answered with one line.
pub struct ScpiSession<T = TcpStream> {
    stream: BufReader<T>,
}

impl ScpiSession<TcpStream> {
    pub fn connect(resource: &Resource, timeout: Duration) -> Result<Self, InstrumentError> {
        let addresses = (resource.host.as_str(), resource.port)
            .to_socket_addrs()
            .map_err(InstrumentError::from_io)?;

        let mut last_error = None;
        for address in addresses {
            debug!("connecting to {}", address);
            match TcpStream::connect_timeout(&address, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    info!("connected to {} ({})", resource, address);
                    return Ok(ScpiSession::new(stream));
                }
                Err(err) => last_error = Some(err),
            }
        }
        Err(match last_error {
            Some(err) => InstrumentError::from_io(err),
            None => InstrumentError::UnsupportedResource(resource.to_string()),
        })
    }
}

impl<T: Read + Write> ScpiSession<T> {
    pub fn new(stream: T) -> Self {
        ScpiSession {
            stream: BufReader::new(stream),
        }
    }

    pub fn into_inner(self) -> T {
        self.stream.into_inner()
    }

    pub fn write(&mut self, command: &str) -> Result<(), InstrumentError> {
        debug!("scpi > {}", command);
        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(b'\n');
        let stream = self.stream.get_mut();
        stream
            .write_all(&line)
            .and_then(|_| stream.flush())
            .map_err(InstrumentError::from_io)
    }

    pub fn query(&mut self, command: &str) -> Result<String, InstrumentError> {
        self.write(command)?;
        let mut line = String::new();
        let read = self
            .stream
            .read_line(&mut line)
            .map_err(InstrumentError::from_io)?;
        if read == 0 {
            return Err(InstrumentError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection closed while waiting for `{}`", command),
            )));
        }
        let response = line.trim_end_matches(&['\r', '\n'][..]).to_string();
        debug!("scpi < {} bytes", response.len());
        Ok(response)
    }

    pub fn query_f64(&mut self, command: &str) -> Result<f64, InstrumentError> {
        let response = self.query(command)?;
        parse_number(command, &response)
    }

    /// Comma separated ASCII numbers, as `TRAC?` answers in ASCII format.
    pub fn query_ascii_values(&mut self, command: &str) -> Result<Vec<f64>, InstrumentError> {
        let response = self.query(command)?;
        response
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| parse_number(command, value))
            .collect()
    }
}

fn parse_number(command: &str, response: &str) -> Result<f64, InstrumentError> {
    match response.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(InstrumentError::MalformedResponse {
            command: command.to_string(),
            response: response.to_string(),
        }),
    }
}

impl<T: Read + Write> InstrumentSession for ScpiSession<T> {
    fn identify(&mut self) -> Result<String, InstrumentError> {
        Ok(self.query("*IDN?")?.trim().to_string())
    }

    fn configure(&mut self, sweep: &SweepSettings) -> Result<(), InstrumentError> {
        self.write(&format!("FREQ:CENT {}", sweep.center_frequency_hz))?;
        self.write(&format!("FREQ:SPAN {}", sweep.span_hz))?;
        self.write(&format!("BAND {}", sweep.resolution_bandwidth_hz))?;
        self.write(&format!("SWE:POIN {}", sweep.sweep_points))?;
        if let Some(preamp) = sweep.preamp {
            self.write(&format!("PREAMP:STATE {}", if preamp { "ON" } else { "OFF" }))?;
        }
        if let Some(attenuation) = sweep.attenuation_db {
            self.write(&format!("INP:ATT {}", attenuation))?;
        }
        Ok(())
    }

    fn acquire_trace(&mut self) -> Result<Trace, InstrumentError> {
        // *WAI holds off the queries below until the sweep has finished
        self.write("INIT;*WAI")?;
        let start = self.query_f64("FREQ:STAR?")?;
        let stop = self.query_f64("FREQ:STOP?")?;
        let amplitudes = self.query_ascii_values("TRAC? TRACE1")?;
        if amplitudes.is_empty() {
            return Err(InstrumentError::EmptyTrace);
        }
        Ok(Trace::from_sweep(start, stop, amplitudes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Answers queries from a canned transcript and records everything written.
    struct ScriptedStream {
        responses: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl ScriptedStream {
        fn new(responses: &str) -> Self {
            ScriptedStream {
                responses: Cursor::new(responses.as_bytes().to_vec()),
                written: Vec::new(),
            }
        }

        fn commands(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.written)
                .lines()
                .map(|l| l.to_string())
                .collect()
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.responses.read(buf)
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn identify() {
        let mut session = ScpiSession::new(ScriptedStream::new(
            "Rohde&Schwarz,FSV-7,1307.9002K07/101234,3.40\r\n",
        ));
        assert_eq!(
            session.identify().unwrap(),
            "Rohde&Schwarz,FSV-7,1307.9002K07/101234,3.40"
        );
        assert_eq!(session.into_inner().commands(), vec!["*IDN?"]);
    }

    #[test]
    fn configure_sends_sweep_settings() {
        let mut session = ScpiSession::new(ScriptedStream::new(""));
        let sweep = SweepSettings {
            preamp: Some(true),
            attenuation_db: Some(10.0),
            ..SweepSettings::default()
        };
        session.configure(&sweep).unwrap();
        assert_eq!(
            session.into_inner().commands(),
            vec![
                "FREQ:CENT 437500000",
                "FREQ:SPAN 125000000",
                "BAND 10000",
                "SWE:POIN 1001",
                "PREAMP:STATE ON",
                "INP:ATT 10",
            ]
        );
    }

    #[test]
    fn configure_skips_unset_preamp_and_attenuation() {
        let mut session = ScpiSession::new(ScriptedStream::new(""));
        session.configure(&SweepSettings::default()).unwrap();
        let commands = session.into_inner().commands();
        assert_eq!(commands.len(), 4);
        assert!(!commands.iter().any(|c| c.starts_with("PREAMP") || c.starts_with("INP")));
    }

    #[test]
    fn acquire_trace() {
        let mut session = ScpiSession::new(ScriptedStream::new(
            "3.75E+08\n5.00E+08\n-9.0E+01,-8.9E+01,-9.1E+01,\n",
        ));
        let trace = session.acquire_trace().unwrap();
        assert_eq!(trace.amplitudes_db, vec![-90.0, -89.0, -91.0]);
        assert_eq!(trace.frequencies_hz, vec![375.0e6, 437.5e6, 500.0e6]);
        assert_eq!(
            session.into_inner().commands(),
            vec!["INIT;*WAI", "FREQ:STAR?", "FREQ:STOP?", "TRAC? TRACE1"]
        );
    }

    #[test]
    fn measure_power_from_trace() {
        let mut session =
            ScpiSession::new(ScriptedStream::new("1E+09\n2E+09\n-40,-40,-40,-40\n"));
        let power = session.measure_power().unwrap();
        assert!((power - -40.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_trace_is_an_error() {
        let mut session = ScpiSession::new(ScriptedStream::new("1E+09\n2E+09\n-40,oops,-41\n"));
        match session.acquire_trace() {
            Err(InstrumentError::MalformedResponse { command, response }) => {
                assert_eq!(command, "TRAC? TRACE1");
                assert_eq!(response, "oops");
            }
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
    }

    #[test]
    fn empty_trace_is_an_error() {
        let mut session = ScpiSession::new(ScriptedStream::new("1E+09\n2E+09\n\n"));
        assert!(matches!(
            session.acquire_trace(),
            Err(InstrumentError::EmptyTrace)
        ));
    }

    #[test]
    fn closed_connection_is_an_error() {
        let mut session = ScpiSession::new(ScriptedStream::new(""));
        assert!(matches!(session.identify(), Err(InstrumentError::Io(_))));
    }
}
