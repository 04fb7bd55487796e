//! Seeded random command streams.
//!
//! Every generated command is valid for the extended revision and leaves
//! the reboot gate open, so each one is answered with a reply ending in the
//! `>` prompt.

use rand::{Rng, seq::SliceRandom};

const DOORS: &[char] = &['s', 'l', 'r'];
const EXPOSE: &[char] = &['s', 'l', 'r', 'e'];
const PISTONS: &[char] = &['a', 'b', 'c', 'p'];
const REPORTS: &[char] = &['a', 'b', 'c', 'B', 'e', 'i', 'o', 'p', 's', 't', 'v'];

/// One random command with id `id`, terminator included.
pub fn random_command<R: Rng>(rng: &mut R, id: u32) -> String {
    let pick = |rng: &mut R, set: &[char]| set.choose(rng).copied().unwrap_or(set[0]);

    let body = match rng.gen_range(0..7) {
        0 => format!("o{}", pick(rng, DOORS)),
        1 => format!("c{}", pick(rng, DOORS)),
        2 => format!("e{}", pick(rng, EXPOSE)),
        3 => format!("M{}{}", pick(rng, PISTONS), rng.gen_range(-50_000..50_000)),
        4 => format!("m{}{}", pick(rng, PISTONS), rng.gen_range(-5_000..5_000)),
        5 => format!("wt{}", rng.gen_range(0..250)),
        _ => format!("r{}", pick(rng, REPORTS)),
    };

    let ending = if rng.gen_bool(0.5) { "\r" } else { "\r\n" };
    format!("{body};{id}{ending}")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use specmech_core::ProtocolConfig;
    use specmech_proto::{Inbound, parse_sentence};

    use super::*;

    #[test]
    fn generated_commands_parse() {
        let options = ProtocolConfig::default().parser_options();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for id in 0..500 {
            let command = random_command(&mut rng, id);
            let parsed = parse_sentence(command.as_bytes(), &options);

            let Ok(Inbound::Command(command)) = parsed else {
                panic!("{command:?} did not parse: {parsed:?}");
            };
            assert_eq!(command.command_id, Some(id.to_string()));
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let stream = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..20).map(|id| random_command(&mut rng, id)).collect::<Vec<_>>()
        };

        assert_eq!(stream(3), stream(3));
        assert_ne!(stream(3), stream(4));
    }
}
