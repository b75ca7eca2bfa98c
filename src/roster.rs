use strsim::jaro_winkler;

use crate::models::Client;

/// The trainer's clients that can receive programs: active and linked only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientRoster {
    clients: Vec<Client>,
}

impl ClientRoster {
    pub fn new(clients: impl IntoIterator<Item = Client>) -> Self {
        Self {
            clients: clients.into_iter().filter(Client::is_reachable).collect(),
        }
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Resolves a 1-based index, an id, or an exact (case-insensitive) name.
    pub fn resolve(&self, needle: &str) -> Option<&Client> {
        if let Ok(idx) = needle.parse::<usize>() {
            if let Some(client) = idx.checked_sub(1).and_then(|i| self.clients.get(i)) {
                return Some(client);
            }
        }

        self.get(needle).or_else(|| {
            self.clients
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(needle))
        })
    }

    /// Closest client name to `input`, if it is a convincing match.
    pub fn suggest(&self, input: &str) -> Option<&Client> {
        const MIN_SCORE: f64 = 0.85;

        let inp = input.to_lowercase();
        self.clients
            .iter()
            .map(|c| (c, jaro_winkler(&inp, &c.name.to_lowercase())))
            .filter(|(_, score)| *score >= MIN_SCORE)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClientStatus;

    fn client(id: &str, name: &str, status: ClientStatus, linked: bool) -> Client {
        Client {
            id: id.into(),
            name: name.into(),
            email: None,
            status,
            linked,
        }
    }

    fn roster() -> ClientRoster {
        ClientRoster::new([
            client("c1", "Maria Lopez", ClientStatus::Active, true),
            client("c2", "Sam Okafor", ClientStatus::Inactive, true),
            client("c3", "Jin Park", ClientStatus::Active, false),
            client("c4", "Ana Silva", ClientStatus::Active, true),
        ])
    }

    #[test]
    fn keeps_only_active_linked_clients() {
        let roster = roster();
        let ids: Vec<_> = roster.clients().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c4"]);
        assert!(!roster.contains("c2"));
        assert!(!roster.contains("c3"));
    }

    #[test]
    fn resolves_index_id_and_name() {
        let roster = roster();
        assert_eq!(roster.resolve("2").map(|c| c.id.as_str()), Some("c4"));
        assert_eq!(roster.resolve("c1").map(|c| c.id.as_str()), Some("c1"));
        assert_eq!(roster.resolve("ana silva").map(|c| c.id.as_str()), Some("c4"));
        assert!(roster.resolve("0").is_none());
        assert!(roster.resolve("Nobody").is_none());
    }

    #[test]
    fn suggests_near_miss_names() {
        let roster = roster();
        assert_eq!(roster.suggest("Maria Lopes").map(|c| c.id.as_str()), Some("c1"));
        assert!(roster.suggest("xyz").is_none());
    }
}
