//! Aggregate statistics for one swarm.

/// The counters a scrape reports for a single info-hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwarmMetadata {
    /// Number of seeders.
    pub complete: u32,
    /// Number of times the torrent has been reported downloaded. Only
    /// tracked when download counting is enabled; zero otherwise.
    pub downloaded: u32,
    /// Number of leechers.
    pub incomplete: u32,
}

impl SwarmMetadata {
    #[must_use]
    pub fn zeroed() -> Self {
        Self::default()
    }
}
