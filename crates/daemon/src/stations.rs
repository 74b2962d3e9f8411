use crate::Cli;

/// Major US airport station ids watched when no explicit set is configured
pub const DEFAULT_MAJOR_AIRPORTS: &[&str] = &[
    "KATL", "KLAX", "KORD", "KDFW", "KDEN", "KJFK", "KSFO", "KSEA", "KLAS", "KMCO", "KEWR", "KMIA",
    "KPHX", "KIAH", "KBOS", "KMSP", "KFLL", "KDTW", "KPHL", "KLGA", "KBWI", "KSLC", "KDCA", "KSAN",
    "KTPA", "KPDX", "KSTL", "KHNL", "KBNA", "KAUS", "KMCI", "KRDU", "KMKE", "KSMF", "KCLT", "KPIT",
    "KSAT", "KOAK", "KCLE", "KSJC", "KIND", "KCVG", "KCMH", "KABQ", "KANC", "KOMA", "KBUF", "KBOI",
];

/// The provider caps how many ids one request may carry
pub const MAX_STATIONS_PER_REQUEST: usize = 50;

/// Resolve the station set to watch from the configuration
pub fn resolve_stations(cli: &Cli) -> Vec<String> {
    match &cli.stations {
        Some(configured) => configured
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect(),
        None => DEFAULT_MAJOR_AIRPORTS
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

/// Split a station set into comma-joined `ids=` values within the provider's
/// per-request cap
pub fn chunk_stations(stations: &[String], chunk_size: usize) -> Vec<String> {
    stations
        .chunks(chunk_size.max(1))
        .map(|chunk| chunk.join(","))
        .collect()
}
