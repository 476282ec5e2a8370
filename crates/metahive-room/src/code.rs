//! Room code generation.

use std::sync::atomic::{AtomicUsize, Ordering};

use metahive_protocol::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomId};
use rand::Rng;

/// Supplies candidate room codes to the registry.
///
/// Candidates need not be unique; the registry checks each one against the
/// active rooms and draws again on a collision.
pub trait CodeSource: Send + Sync + 'static {
    /// Returns the next candidate code.
    fn next_code(&self) -> RoomId;
}

impl<F> CodeSource for F
where
    F: Fn() -> RoomId + Send + Sync + 'static,
{
    fn next_code(&self) -> RoomId {
        self()
    }
}

/// Draws each character uniformly from [`ROOM_CODE_ALPHABET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn next_code(&self) -> RoomId {
        random_code()
    }
}

/// Generates a random [`ROOM_CODE_LEN`]-character room code.
pub fn random_code() -> RoomId {
    let mut rng = rand::rng();
    let code: String = (0..ROOM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            char::from(ROOM_CODE_ALPHABET[idx])
        })
        .collect();
    RoomId::new(code)
}

/// Hands out a fixed list of codes in order, then repeats the last one.
///
/// Makes room codes predictable in tests and demos. An empty list falls
/// back to [`random_code`].
#[derive(Debug, Default)]
pub struct ScriptedCodes {
    codes: Vec<RoomId>,
    next: AtomicUsize,
}

impl ScriptedCodes {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RoomId>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl CodeSource for ScriptedCodes {
    fn next_code(&self) -> RoomId {
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        match self.codes.get(idx).or_else(|| self.codes.last()) {
            Some(code) => code.clone(),
            None => random_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_random_code_is_well_formed() {
        for _ in 0..1_000 {
            let code = random_code();
            assert!(code.is_well_formed(), "bad code {code}");
        }
    }

    #[test]
    fn test_random_code_uses_whole_alphabet() {
        let mut seen = HashSet::new();
        for _ in 0..2_000 {
            seen.extend(random_code().as_str().bytes());
        }
        // 12k uniform draws over 36 symbols; missing one is vanishingly
        // unlikely.
        assert_eq!(seen.len(), ROOM_CODE_ALPHABET.len());
    }

    #[test]
    fn test_scripted_codes_repeat_last() {
        let codes = ScriptedCodes::new(["AAAAAA", "BBBBBB"]);
        assert_eq!(codes.next_code(), RoomId::new("AAAAAA"));
        assert_eq!(codes.next_code(), RoomId::new("BBBBBB"));
        assert_eq!(codes.next_code(), RoomId::new("BBBBBB"));
    }

    #[test]
    fn test_scripted_codes_empty_falls_back_to_random() {
        let codes = ScriptedCodes::new(Vec::<RoomId>::new());
        assert!(codes.next_code().is_well_formed());
    }

    #[test]
    fn test_closure_is_a_code_source() {
        let source = || RoomId::new("ZZ0000");
        assert_eq!(source.next_code(), RoomId::new("ZZ0000"));
    }
}
