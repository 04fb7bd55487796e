//! Session loop tests over in-memory streams.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use specmech_core::{DeviceSeeds, ProtocolConfig, ProtocolEngine, Revision};
use specmech_proto::{DoorId, DoorState, PistonId};
use specmech_server::{DEFAULT_CHUNK_SIZE, Session, SystemEnv};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

fn engine(revision: Revision) -> ProtocolEngine<SystemEnv> {
    ProtocolEngine::new(
        SystemEnv::new(),
        ProtocolConfig::for_revision(revision),
        &DeviceSeeds::default(),
    )
}

fn connect(engine: &ProtocolEngine<SystemEnv>) -> (DuplexStream, tokio::task::JoinHandle<()>) {
    let (client, server) = tokio::io::duplex(4096);
    let session = Session::new(1, engine.clone(), DEFAULT_CHUNK_SIZE);
    let task = tokio::spawn(async move {
        session.run(server).await.expect("session should end cleanly");
    });
    (client, task)
}

async fn expect(client: &mut DuplexStream, expected: &str) {
    let mut buf = vec![0u8; expected.len()];
    client.read_exact(&mut buf).await.expect("reply bytes");
    assert_eq!(String::from_utf8_lossy(&buf), expected);
}

#[tokio::test(start_paused = true)]
async fn wake_move_report() {
    let engine = engine(Revision::Legacy);
    let (mut client, _task) = connect(&engine);

    client.write_all(b"ra\r").await.expect("write");
    expect(&mut client, "\r\n!").await;

    client.write_all(b"!\r\n").await.expect("write");
    expect(&mut client, "\r\n>").await;

    client.write_all(b"Ma100\r").await.expect("write");
    expect(&mut client, "\r\n>").await;

    client.write_all(b"ra\r").await.expect("write");
    expect(&mut client, "$S2MRA,100*22\r\n\r\n>").await;
}

#[tokio::test(start_paused = true)]
async fn sentences_split_across_reads() {
    let engine = engine(Revision::Legacy);
    let (mut client, _task) = connect(&engine);

    client.write_all(b"!").await.expect("write");
    tokio::time::sleep(Duration::from_millis(1)).await;
    client.write_all(b"\r").await.expect("write");
    tokio::time::sleep(Duration::from_millis(1)).await;
    client.write_all(b"\nrb\rrc").await.expect("write");
    tokio::time::sleep(Duration::from_millis(1)).await;
    client.write_all(b"\r\n").await.expect("write");

    expect(&mut client, "\r\n>$S2MRB,234324*10\r\n\r\n>$S2MRC,234324*11\r\n\r\n>").await;
}

#[tokio::test(start_paused = true)]
async fn framing_errors_do_not_end_the_session() {
    let engine = engine(Revision::Legacy);
    let (mut client, _task) = connect(&engine);
    client.write_all(b"!\r").await.expect("write");
    expect(&mut client, "\r\n>").await;

    client.write_all(b"Z\rox\rMaabc\rra\n").await.expect("write");
    expect(&mut client, &"$S2ERR*24\r\n".repeat(4)).await;

    client.write_all(b"ra\r").await.expect("write");
    expect(&mut client, "$S2MRA,234324*13\r\n\r\n>").await;
}

#[tokio::test(start_paused = true)]
async fn overlong_fragment_is_an_error() {
    let engine = engine(Revision::Legacy);
    let (mut client, _task) = connect(&engine);
    client.write_all(b"!\r").await.expect("write");
    expect(&mut client, "\r\n>").await;

    client.write_all(&[b'M'; DEFAULT_CHUNK_SIZE + 1]).await.expect("write");

    expect(&mut client, "$S2ERR*24\r\n").await;
}

#[tokio::test(start_paused = true)]
async fn quit_closes_the_stream() {
    let engine = engine(Revision::Legacy);
    let (mut client, task) = connect(&engine);

    client.write_all(b"q\r").await.expect("write");

    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.expect("read to end");
    assert!(rest.is_empty());
    task.await.expect("session task");
}

#[tokio::test(start_paused = true)]
async fn door_move_acks_before_settling() {
    let engine = engine(Revision::Legacy);
    let (mut client, _task) = connect(&engine);
    client.write_all(b"!\r").await.expect("write");
    expect(&mut client, "\r\n>").await;

    client.write_all(b"os\r").await.expect("write");
    expect(&mut client, "\r\n>").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.registry().door(DoorId::Shutter).state(), DoorState::Transitioning);

    client.write_all(b"rp\r").await.expect("write");
    expect(&mut client, "$S2PNU,o,s,c,l,c,r,1,p*69\r\n\r\n>").await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_mid_move_still_settles() {
    let engine = engine(Revision::Legacy);
    let (mut client, task) = connect(&engine);
    client.write_all(b"!\r").await.expect("write");
    expect(&mut client, "\r\n>").await;

    client.write_all(b"ee\r").await.expect("write");
    expect(&mut client, "\r\n>").await;
    client.write_all(b"es\r").await.expect("write");
    expect(&mut client, "\r\n>").await;
    drop(client);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let registry = engine.registry();
    assert_eq!(registry.door(DoorId::Left).state(), DoorState::Open);
    assert_eq!(registry.door(DoorId::Right).state(), DoorState::Open);
    assert_eq!(registry.door(DoorId::Shutter).state(), DoorState::Open);
    task.await.expect("session task");
}

#[tokio::test(start_paused = true)]
async fn wait_holds_only_its_own_connection() {
    let engine = engine(Revision::Extended);
    let (mut slow, _slow_task) = connect(&engine);
    let (mut fast, _fast_task) = connect(&engine);
    slow.write_all(b"!\r").await.expect("write");
    expect(&mut slow, "\r\n>").await;

    let start = tokio::time::Instant::now();
    slow.write_all(b"wt5000;1\r").await.expect("write");
    fast.write_all(b"rv;2\r").await.expect("write");

    expect(&mut fast, "$S2VER,2020-12-16*08\r\n;2\r\n>").await;
    assert!(start.elapsed() < Duration::from_secs(5));

    expect(&mut slow, ";1\r\n>").await;
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn gate_is_shared_between_connections() {
    let engine = engine(Revision::Extended);
    let (mut first, _first_task) = connect(&engine);
    let (mut second, _second_task) = connect(&engine);

    first.write_all(b"!\r").await.expect("write");
    expect(&mut first, "\r\n>").await;

    second.write_all(b"ra;5\r").await.expect("write");
    expect(&mut second, "$S2MRA,234324*13\r\n;5\r\n>").await;

    second.write_all(b"R\r").await.expect("write");
    expect(&mut second, "\r\n>").await;

    first.write_all(b"ra\r").await.expect("write");
    expect(&mut first, "\r\n!").await;
}

/// Random read boundaries must not change what the client sees.
#[tokio::test(start_paused = true)]
async fn random_write_boundaries() {
    let script: &[u8] = b"!\r\nMa100\rmb-100\r\nra\rrb\rZ\rrc\r\n";
    let expected = concat!(
        "\r\n>",
        "\r\n>",
        "\r\n>",
        "$S2MRA,100*22\r\n\r\n>",
        "$S2MRB,234224*11\r\n\r\n>",
        "$S2ERR*24\r\n",
        "$S2MRC,234324*11\r\n\r\n>",
    );

    for seed in 0..16 {
        let engine = engine(Revision::Legacy);
        let (mut client, _task) = connect(&engine);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut rest = script;
        while !rest.is_empty() {
            let cut = rng.gen_range(1..=rest.len().min(5));
            let (head, tail) = rest.split_at(cut);
            client.write_all(head).await.expect("write");
            tokio::time::sleep(Duration::from_millis(1)).await;
            rest = tail;
        }

        expect(&mut client, expected).await;
    }
}

#[tokio::test(start_paused = true)]
async fn pistons_report_seeded_positions() {
    let mut seeds = DeviceSeeds::default();
    seeds.pistons = [1, -2, 3];
    let engine = ProtocolEngine::new(SystemEnv::new(), ProtocolConfig::default(), &seeds);

    assert_eq!(engine.registry().piston(PistonId::B).position(), -2);
}
