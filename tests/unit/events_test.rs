//! Tests for event sinks

use enrollment_admission::core::{AutoEnrollPartial, DomainEvent, EventSink, InMemoryEventSink};
use enrollment_admission::infra::ChannelEventSink;
use enrollment_admission::util::{OfferingId, StudentId};

fn partial(student: u64) -> DomainEvent {
    DomainEvent::AutoEnrollPartial(AutoEnrollPartial {
        offering: OfferingId(1),
        student: StudentId(student),
        capacity: 3,
    })
}

#[test]
fn test_in_memory_sink_records_in_order() {
    let sink = InMemoryEventSink::new(10);
    sink.publish(partial(1)).unwrap();
    sink.publish(partial(2)).unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], partial(1));
    assert_eq!(events[1].kind(), "auto_enroll_partial");
}

#[test]
fn test_in_memory_sink_overflow() {
    let sink = InMemoryEventSink::new(2);
    for s in 1..=3 {
        sink.publish(partial(s)).unwrap();
    }
    let events = sink.events();
    assert_eq!(events, vec![partial(2), partial(3)]);
}

#[test]
fn test_channel_sink_delivers() {
    let (sink, rx) = ChannelEventSink::bounded(4);
    sink.publish(partial(7)).unwrap();
    assert_eq!(rx.try_recv().unwrap(), partial(7));
}

#[test]
fn test_partial_event_json_shape() {
    let json = serde_json::to_value(partial(4)).unwrap();
    assert_eq!(json["type"], "auto_enroll_partial");
    assert_eq!(json["student"], 4);
    assert_eq!(json["capacity"], 3);
}
