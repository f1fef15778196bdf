mod common;

use std::time::Duration;

use colectivo_proto::protocol::PlaybackStatus;
use colectivo_proto::station::{
    Effect, LoadToken, PlaybackErrorKind, PlayerEvent, PlayerEventKind, StationController,
};
use common::{controller, FakePlayer, ADVANCE_DELAY};
use tokio::sync::mpsc;

fn playing(token: LoadToken) -> PlayerEvent {
    PlayerEvent {
        token,
        kind: PlayerEventKind::Playing,
    }
}

#[test]
fn next_n_times_returns_to_start() {
    for n in 1..=6 {
        for start in 0..n {
            let mut c = controller(n as u32);
            c.select_station(start).unwrap();
            for _ in 0..n {
                c.select_next_station();
            }
            assert_eq!(c.current_index(), start, "n={} start={}", n, start);
            for _ in 0..n {
                c.select_previous_station();
            }
            assert_eq!(c.current_index(), start);
        }
    }
}

#[test]
fn volume_is_clamped() {
    let mut c = controller(2);
    let mut player = FakePlayer::default();
    player.apply(c.set_volume(-10));
    assert_eq!(c.volume(), 0);
    assert_eq!(player.volume, Some(0));
    player.apply(c.set_volume(150));
    assert_eq!(c.volume(), 100);
    assert_eq!(player.volume, Some(100));
    player.apply(c.set_volume(i32::MIN));
    assert_eq!(c.volume(), 0);
}

#[test]
fn switching_while_playing_never_overlaps_streams() {
    let mut c = controller(3);
    let mut player = FakePlayer::default();
    player.apply(c.play());
    let a = player.token();
    player.apply(c.on_player_event(playing(a)));
    assert_eq!(c.status(), PlaybackStatus::Playing);

    let effects = c.select_station(1).unwrap();
    assert!(matches!(
        effects.as_slice(),
        [Effect::Stop, Effect::Load { token, .. }] if token.station == 1
    ));
    player.apply(effects);
    assert_eq!(c.status(), PlaybackStatus::Loading);
    let (url, b) = player.loaded().cloned().unwrap();
    assert_eq!(url, "https://radio.example.org/2.mp3");
    assert_eq!(b.station, 1);
    assert_eq!(player.max_concurrent, 1);

    // A's late confirmation must not claim B is playing
    player.apply(c.on_player_event(playing(a)));
    assert_eq!(c.status(), PlaybackStatus::Loading);
    player.apply(c.on_player_event(playing(b)));
    assert_eq!(c.status(), PlaybackStatus::Playing);
}

#[test]
fn fake_player_counts_overlapping_loads() {
    let token = |generation| LoadToken {
        station: 0,
        generation,
    };
    let mut player = FakePlayer::default();
    player.apply(vec![
        Effect::Load {
            url: "a".into(),
            token: token(1),
            volume: 50,
        },
        Effect::Load {
            url: "b".into(),
            token: token(2),
            volume: 50,
        },
    ]);
    assert_eq!(player.max_concurrent, 2);
    assert!(player.loaded().is_none());
    player.apply(vec![Effect::Stop]);
    assert!(player.streams.is_empty());
}

#[test]
fn no_sequence_of_actions_opens_two_streams() {
    let mut c = controller(4);
    let mut player = FakePlayer::default();
    let report = |c: &mut StationController, player: &mut FakePlayer, kind| {
        let token = c.current_token();
        player.apply(c.on_player_event(PlayerEvent { token, kind }));
    };
    for step in 0..200usize {
        match step % 11 {
            0 => player.apply(c.play()),
            1 => report(&mut c, &mut player, PlayerEventKind::Playing),
            2 => player.apply(c.select_next_station()),
            3 => report(&mut c, &mut player, PlayerEventKind::Waiting),
            4 => player.apply(c.select_station(step % 4).unwrap()),
            5 => report(
                &mut c,
                &mut player,
                PlayerEventKind::Failed(PlaybackErrorKind::UnsupportedFormat),
            ),
            6 => {
                if let Some((token, _)) = player.scheduled.pop() {
                    player.apply(c.on_auto_advance(token));
                }
            }
            7 => report(&mut c, &mut player, PlayerEventKind::Paused),
            8 => player.apply(c.toggle()),
            9 => player.apply(c.select_previous_station()),
            _ => report(
                &mut c,
                &mut player,
                PlayerEventKind::Failed(PlaybackErrorKind::Network),
            ),
        }
        assert!(player.streams.len() <= 1, "step {}: {:?}", step, player.streams);
    }
    assert_eq!(player.max_concurrent, 1);
}

#[test]
fn rapid_switches_act_on_the_last_request() {
    let mut c = controller(4);
    let mut player = FakePlayer::default();
    player.apply(c.play());
    let mut tokens = vec![player.token()];
    for idx in [1, 2, 3] {
        player.apply(c.select_station(idx).unwrap());
        tokens.push(player.token());
    }
    for t in &tokens[..3] {
        player.apply(c.on_player_event(playing(*t)));
        assert_eq!(c.status(), PlaybackStatus::Loading);
    }
    player.apply(c.on_player_event(playing(tokens[3])));
    assert_eq!(c.status(), PlaybackStatus::Playing);
    assert_eq!(c.current_index(), 3);
}

#[test]
fn failure_resets_playing_and_reports_error() {
    let mut c = controller(2);
    let mut player = FakePlayer::default();
    player.apply(c.play());
    let token = player.token();
    player.apply(c.on_player_event(PlayerEvent {
        token,
        kind: PlayerEventKind::Failed(PlaybackErrorKind::PermissionBlocked),
    }));
    let state = c.playback_state();
    assert!(!state.is_playing);
    assert!(!state.is_loading);
    assert!(state.last_error.is_some());
    assert!(player.streams.is_empty());
    assert!(player.scheduled.is_empty());
}

/// Drives the controller the way the station core does: effects are applied,
/// advance timers really sleep.
async fn run_advance_timer(
    c: &mut StationController,
    player: &mut FakePlayer,
) -> Option<Duration> {
    let (token, after) = player.scheduled.pop()?;
    let (tx, mut rx) = mpsc::channel(1);
    let started = tokio::time::Instant::now();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let _ = tx.send(token).await;
    });
    let token = rx.recv().await?;
    player.apply(c.on_auto_advance(token));
    Some(started.elapsed())
}

#[tokio::test(start_paused = true)]
async fn unsupported_format_auto_advances_within_delay() {
    let mut c = controller(3);
    let mut player = FakePlayer::default();
    player.apply(c.play());
    let token = player.token();
    player.apply(c.on_player_event(PlayerEvent {
        token,
        kind: PlayerEventKind::Failed(PlaybackErrorKind::UnsupportedFormat),
    }));
    assert_eq!(c.status(), PlaybackStatus::Errored);
    assert_eq!(player.scheduled, vec![(token, ADVANCE_DELAY)]);

    let waited = run_advance_timer(&mut c, &mut player).await.unwrap();
    assert!(waited >= ADVANCE_DELAY);
    assert!(waited < ADVANCE_DELAY + Duration::from_millis(50));
    assert_eq!(c.current_index(), 1);
    assert_eq!(c.status(), PlaybackStatus::Loading);
    assert_eq!(player.token().station, 1);
    // the error stays visible while the next station loads
    assert!(c.last_error().is_some());

    player.apply(c.on_player_event(playing(player.token())));
    assert_eq!(c.status(), PlaybackStatus::Playing);
    assert!(c.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn user_action_cancels_pending_advance() {
    let mut c = controller(3);
    let mut player = FakePlayer::default();
    player.apply(c.play());
    let token = player.token();
    player.apply(c.on_player_event(PlayerEvent {
        token,
        kind: PlayerEventKind::Failed(PlaybackErrorKind::UnsupportedFormat),
    }));
    player.apply(c.play());
    let retry = player.token();
    run_advance_timer(&mut c, &mut player).await;
    assert_eq!(c.current_index(), 0);
    assert_eq!(player.token(), retry);
}

#[test]
fn effects_for_idle_switch_only_stop() {
    let mut c = controller(3);
    assert_eq!(c.select_station(2).unwrap(), vec![Effect::Stop]);
    assert_eq!(c.status(), PlaybackStatus::Idle);
}
