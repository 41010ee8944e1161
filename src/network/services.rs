//! Port number to conventional service name lookup

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// Returned when no name is known for a port
pub const UNKNOWN_SERVICE: &str = "Unknown Service";

/// Path of the system services database on Unix-like hosts
pub const SYSTEM_SERVICES_PATH: &str = "/etc/services";

static BUILTIN_TCP_SERVICES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    [
        (7, "echo"),
        (20, "ftp-data"),
        (21, "ftp"),
        (22, "ssh"),
        (23, "telnet"),
        (25, "smtp"),
        (53, "domain"),
        (79, "finger"),
        (80, "http"),
        (88, "kerberos"),
        (110, "pop3"),
        (111, "sunrpc"),
        (119, "nntp"),
        (135, "epmap"),
        (139, "netbios-ssn"),
        (143, "imap"),
        (179, "bgp"),
        (389, "ldap"),
        (443, "https"),
        (445, "microsoft-ds"),
        (465, "submissions"),
        (514, "shell"),
        (515, "printer"),
        (554, "rtsp"),
        (587, "submission"),
        (631, "ipp"),
        (636, "ldaps"),
        (873, "rsync"),
        (993, "imaps"),
        (995, "pop3s"),
        (1080, "socks"),
        (1433, "ms-sql-s"),
        (1521, "oracle"),
        (1723, "pptp"),
        (1883, "mqtt"),
        (2049, "nfs"),
        (2375, "docker"),
        (3128, "squid-http"),
        (3306, "mysql"),
        (3389, "ms-wbt-server"),
        (5060, "sip"),
        (5432, "postgresql"),
        (5672, "amqp"),
        (5900, "vnc"),
        (5984, "couchdb"),
        (6379, "redis"),
        (6443, "sun-sr-https"),
        (8080, "http-alt"),
        (8443, "https-alt"),
        (9092, "kafka"),
        (9200, "elasticsearch"),
        (11211, "memcache"),
        (27017, "mongodb"),
    ]
    .into_iter()
    .collect()
});

/// Best-effort service name table.
///
/// Lookups never fail; an unknown port yields [`UNKNOWN_SERVICE`].
#[derive(Debug, Clone)]
pub struct ServiceDatabase {
    tcp_services: HashMap<u16, String>,
}

impl Default for ServiceDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceDatabase {
    /// Built-in table only
    pub fn new() -> Self {
        let tcp_services = BUILTIN_TCP_SERVICES
            .iter()
            .map(|(port, name)| (*port, (*name).to_string()))
            .collect();

        Self { tcp_services }
    }

    /// Built-in table plus the system services file, if it can be read
    pub fn load() -> Self {
        Self::load_from(SYSTEM_SERVICES_PATH)
    }

    /// Built-in table plus a services(5) style file.
    ///
    /// The file wins over the built-in names. Read failures leave the
    /// built-in table in place.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let mut db = Self::new();

        match std::fs::read_to_string(path.as_ref()) {
            Ok(content) => {
                let parsed = parse_services(&content);
                log::debug!(
                    "Loaded {} tcp service names from {}",
                    parsed.len(),
                    path.as_ref().display()
                );
                db.tcp_services.extend(parsed);
            }
            Err(e) => {
                log::debug!(
                    "Service file {} unavailable ({}), using built-in names",
                    path.as_ref().display(),
                    e
                );
            }
        }

        db
    }

    pub fn lookup(&self, port: u16) -> Option<&str> {
        self.tcp_services.get(&port).map(String::as_str)
    }

    pub fn name_or_unknown(&self, port: u16) -> String {
        self.lookup(port).unwrap_or(UNKNOWN_SERVICE).to_string()
    }

    pub fn len(&self) -> usize {
        self.tcp_services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tcp_services.is_empty()
    }
}

/// Parse `name port/proto [aliases...]` lines, keeping the first tcp name per port
fn parse_services(content: &str) -> HashMap<u16, String> {
    let mut services = HashMap::new();

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let mut fields = line.split_whitespace();
        let (Some(name), Some(port_proto)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Some((port, proto)) = port_proto.split_once('/') else {
            continue;
        };
        if !proto.eq_ignore_ascii_case("tcp") {
            continue;
        }
        if let Ok(port) = port.parse::<u16>() {
            services.entry(port).or_insert_with(|| name.to_string());
        }
    }

    services
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_lookup() {
        let db = ServiceDatabase::new();
        assert_eq!(db.lookup(22), Some("ssh"));
        assert_eq!(db.lookup(443), Some("https"));
        assert_eq!(db.name_or_unknown(22), "ssh");
    }

    #[test]
    fn test_unknown_port_gets_sentinel() {
        let db = ServiceDatabase::new();
        assert_eq!(db.lookup(48123), None);
        assert_eq!(db.name_or_unknown(48123), UNKNOWN_SERVICE);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let db = ServiceDatabase::load_from("/no/such/services/file");
        assert_eq!(db.len(), ServiceDatabase::new().len());
        assert_eq!(db.lookup(80), Some("http"));
    }

    #[test]
    fn test_services_file_parsing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment line").unwrap();
        writeln!(file, "custom-svc   4242/tcp   cs   # trailing comment").unwrap();
        writeln!(file, "custom-dup   4242/tcp").unwrap();
        writeln!(file, "udp-only     4343/udp").unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file, "badport      notaport/tcp").unwrap();

        let db = ServiceDatabase::load_from(file.path());
        assert_eq!(db.lookup(4242), Some("custom-svc"));
        assert_eq!(db.lookup(4343), None);
        assert_eq!(db.lookup(22), Some("ssh"));
    }
}
