use super::RTCIceCandidateInit;

/// Candidates received from the opposite endpoint that are waiting to be
/// applied with `add_ice_candidate`.
///
/// Applying a remote candidate before the remote description exists is
/// invalid, so a flush requested while the remote description is still
/// missing is deferred and released by [`CandidateBuffer::remote_description_set`].
#[derive(Default, Debug)]
pub struct CandidateBuffer {
    pending: Vec<RTCIceCandidateInit>,
    has_remote_description: bool,
    flush_deferred: bool,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        CandidateBuffer::default()
    }

    pub fn push(&mut self, candidate: RTCIceCandidateInit) {
        self.pending.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn has_remote_description(&self) -> bool {
        self.has_remote_description
    }

    pub fn is_flush_deferred(&self) -> bool {
        self.flush_deferred
    }

    /// Drains every buffered candidate, or defers the flush if the owning
    /// endpoint has no remote description yet.
    pub fn flush(&mut self) -> Vec<RTCIceCandidateInit> {
        if !self.has_remote_description {
            self.flush_deferred = true;
            return vec![];
        }
        std::mem::take(&mut self.pending)
    }

    /// Records that the owning endpoint applied its remote description and
    /// returns the candidates of a flush that was deferred until now.
    pub fn remote_description_set(&mut self) -> Vec<RTCIceCandidateInit> {
        self.has_remote_description = true;
        if std::mem::take(&mut self.flush_deferred) {
            std::mem::take(&mut self.pending)
        } else {
            vec![]
        }
    }
}
