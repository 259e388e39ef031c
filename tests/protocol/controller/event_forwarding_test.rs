//! Port events forwarded to an async consumer through an embassy channel,
//! with the port shared behind a blocking mutex.

mod helpers {
    include!("../../helpers/mod.rs");
}

use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use helpers::MockLink;
use korri_fullcan::{
    infra::codec::wire::serialize,
    protocol::{
        controller::{
            Bitrate, BusState, ChannelPort, Direction, ErrorKind, EventForwarder, Mode, PortEvent,
            SharedPort,
        },
        frame::{CanFrame, FrameFormat},
    },
};
use tokio::time::{timeout, Duration};

type Forwarder<'a> = EventForwarder<'a, NoopRawMutex, 4>;
type Shared<'a> = SharedPort<NoopRawMutex, MockLink, Forwarder<'a>, 4, 2>;

fn shared(channel: &Channel<NoopRawMutex, PortEvent, 4>) -> Shared<'_> {
    let mut port = ChannelPort::new(MockLink::default());
    port.driver_init(1, EventForwarder::new(channel)).unwrap();
    port.set_bitrate(Bitrate::Rate250K, Bitrate::None).unwrap();
    port.set_mode(Mode::Operation).unwrap();
    SharedPort::new(port)
}

#[tokio::test]
async fn received_and_transmitted_events_reach_consumer() {
    let channel = Channel::<NoopRawMutex, PortEvent, 4>::new();
    let port = shared(&channel);

    port.with(|port| {
        port.buffer_config(0, 0x80, 0x7FF, FrameFormat::ClassicStd, Direction::Receive)
            .unwrap();
        port.buffer_config(1, 0x81, 0x7FF, FrameFormat::ClassicStd, Direction::Transmit)
            .unwrap();
        port.buffer_send(1).unwrap();
    });

    // Transport side: one block in, one completion.
    let block = serialize(&CanFrame::with_data(FrameFormat::ClassicStd, 0x80, &[7]));
    port.with(|port| port.on_bytes_received(&block));
    port.with(|port| port.on_transmit_complete());

    let first = timeout(Duration::from_millis(100), channel.receive())
        .await
        .expect("receive event");
    match first {
        PortEvent::Received { index, frame } => {
            assert_eq!(index, 0);
            assert_eq!(frame.payload(), &[7]);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let second = timeout(Duration::from_millis(100), channel.receive())
        .await
        .expect("transmit event");
    assert!(matches!(
        second,
        PortEvent::Transmitted { index: 1, frame } if frame.identifier() == 0x81
    ));
}

#[tokio::test]
async fn bus_errors_are_forwarded() {
    let channel = Channel::<NoopRawMutex, PortEvent, 4>::new();
    let port = shared(&channel);

    port.with(|port| port.on_bus_state(BusState::Passive, 128, 3));

    match channel.receive().await {
        PortEvent::Error(state) => {
            assert_eq!(state.bus_state, BusState::Passive);
            assert_eq!(state.last_error, ErrorKind::Bus);
            assert_eq!(state.rx_error_count, 128);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn full_channel_drops_and_counts() {
    let channel = Channel::<NoopRawMutex, PortEvent, 4>::new();
    let port = shared(&channel);

    for _ in 0..6 {
        port.with(|port| port.on_bytes_received(&[0u8; 3]));
    }

    let dropped = port.with(|port| port.handler().map(|forwarder| forwarder.dropped()));
    assert_eq!(dropped, Some(2));
    assert_eq!(port.with(|port| port.statistics().unwrap().errors), 6);

    for _ in 0..4 {
        assert!(matches!(channel.receive().await, PortEvent::Error(_)));
    }
    assert!(channel.try_receive().is_err());

    let port = port.into_inner();
    assert_eq!(port.link().outbox.len(), 0);
}
