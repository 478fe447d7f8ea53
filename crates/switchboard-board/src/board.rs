//! The board: every card placed so far and the links between them.

use tracing::debug;

use crate::{BoardError, Connectivity, Host};

/// Placed cards, in placement order.
#[derive(Debug, Default, Clone)]
pub struct Board {
    hosts: Vec<Host>,
    /// Pairs of indices into `hosts` that are connected.
    links: Vec<(usize, usize)>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Hosts directly connected to the host at `index`.
    pub fn neighbours(&self, index: usize) -> impl Iterator<Item = &Host> + '_ {
        self.links.iter().filter_map(move |&(a, b)| match index {
            i if i == a => self.hosts.get(b),
            i if i == b => self.hosts.get(a),
            _ => None,
        })
    }

    /// Places `host` if it sits legally against every card already down.
    ///
    /// Returns the index it was placed at.
    ///
    /// # Errors
    /// [`BoardError::IllegalPlacement`] naming the first card it conflicts
    /// with. The board is unchanged.
    pub fn place(&mut self, host: Host) -> Result<usize, BoardError> {
        let mut connected = Vec::new();
        for (i, placed) in self.hosts.iter().enumerate() {
            match host.check_connectivity(placed) {
                Connectivity::Disconnected => {}
                Connectivity::Connected => connected.push(i),
                Connectivity::Error => {
                    return Err(BoardError::IllegalPlacement {
                        host: host.name.clone(),
                        against: placed.name.clone(),
                    });
                }
            }
        }

        let index = self.hosts.len();
        debug!(host = %host.name, index, links = connected.len(), "placed host");
        self.links.extend(connected.into_iter().map(|i| (i, index)));
        self.hosts.push(host);
        Ok(index)
    }
}
