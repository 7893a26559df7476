#![allow(non_snake_case)]

use super::*;

#[test]
fn BusError___no_route___is_publish_failure() {
    let err = BusError::NoRoute("amq.gen-1".into());

    assert!(err.is_publish_failure());
    assert_eq!(err.to_string(), "no route to address 'amq.gen-1'");
}

#[test]
fn BusError___connection_closed___is_not_publish_failure() {
    assert!(!BusError::ConnectionClosed.is_publish_failure());
}

#[test]
fn BusError___publish_failed___converts_to_publish_error() {
    let err = BusError::PublishFailed {
        address: "reply".into(),
        reason: "channel flow".into(),
    };

    let rpc: RpcError = err.into();

    assert!(matches!(rpc, RpcError::PublishError(_)));
    assert!(!rpc.is_fatal());
}

#[test]
fn BusError___connection_closed___converts_to_fatal_transport_error() {
    let rpc: RpcError = BusError::ConnectionClosed.into();

    assert!(matches!(rpc, RpcError::TransportError(_)));
    assert!(rpc.is_fatal());
}

#[test]
fn BusError___unknown_delivery_tag___converts_to_transport_error() {
    let rpc: RpcError = BusError::UnknownDeliveryTag(7).into();

    assert!(matches!(rpc, RpcError::TransportError(ref msg) if msg.contains('7')));
}
