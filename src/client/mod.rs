mod connect;
mod error;
mod event;
mod parser;
mod requests;
mod transport;
mod txbuf;

pub use self::connect::{ConnectInfo, Will};
pub use self::error::{Error, Result};
pub use self::event::{Event, RequestResult};
pub use self::transport::Transport;

use core::marker::PhantomData;

use crate::log;
use crate::protocol::types::{FixedHeader, VariableByteInteger};
use crate::protocol::v311::{self, ConnAck, ConnectReturnCode, PubAck, PubComp, PubRec, PubRel, SubAck, UnsubAck};
use crate::protocol::QoS;
use crate::traits::{Sink, Writable};

use self::parser::Parser;
use self::requests::RequestTable;
use self::txbuf::TxBuffer;

/// Default bound on the number of QoS / subscribe / unsubscribe requests a [`Client`] can track
/// simultaneously, used when no explicit `N` is chosen.
pub const DEFAULT_MAX_REQUESTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

struct TxSink<'a>(&'a mut TxBuffer);

impl Sink for TxSink<'_> {
    fn write_bytes(&mut self, data: &[u8]) {
        let written = self.0.write(data);
        debug_assert_eq!(written, data.len(), "encode overran the pre-checked tx buffer");
    }
}

/// A MQTT 3.1.1 client protocol engine.
///
/// The engine performs no I/O: the application drives it by calling [`Self::connect`] /
/// [`Self::subscribe`] / [`Self::unsubscribe`] / [`Self::publish`] / [`Self::disconnect`], and by
/// forwarding transport activity through [`Self::on_active`], [`Self::on_recv`],
/// [`Self::on_sent`], [`Self::on_poll`], [`Self::on_close`] and [`Self::on_error`]. Every entry
/// point must be serialized by the caller; the engine itself takes no internal lock.
///
/// `N` bounds the number of QoS 1/2 publishes, subscribes and unsubscribes that may be pending
/// acknowledgement at once.
pub struct Client<'a, T, const N: usize = DEFAULT_MAX_REQUESTS> {
    state: ConnState,
    info: Option<ConnectInfo<'a>>,
    tx: TxBuffer,
    parser: Parser,
    requests: RequestTable<N>,
    next_packet_id: u16,
    written_total: usize,
    sent_total: usize,
    poll_time: u32,
    poll_interval_ms: u32,
    arg: usize,
    _transport: PhantomData<fn(&mut T)>,
}

impl<'a, T, const N: usize> Client<'a, T, N>
where
    T: Transport,
{
    /// Allocates a client with a `tx_len`-byte transmit buffer, a `rx_len`-byte receive staging
    /// buffer, and a keep-alive poll cadence of `poll_interval_ms` milliseconds — the rate at
    /// which the caller promises to invoke [`Self::on_poll`].
    pub fn new(tx_len: usize, rx_len: usize, poll_interval_ms: u32) -> Self {
        Self {
            state: ConnState::Disconnected,
            info: None,
            tx: TxBuffer::new(tx_len),
            parser: Parser::new(rx_len),
            requests: RequestTable::new(),
            next_packet_id: 1,
            written_total: 0,
            sent_total: 0,
            poll_time: 0,
            poll_interval_ms,
            arg: 0,
            _transport: PhantomData,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnState::Connected
    }

    pub fn set_arg(&mut self, arg: usize) {
        self.arg = arg;
    }

    pub fn get_arg(&self) -> usize {
        self.arg
    }

    /// Records the parameters of a new session and transitions to `CONNECTING`.
    ///
    /// The actual network handshake is the caller's responsibility; once the transport becomes
    /// usable the caller must invoke [`Self::on_active`], which is what actually emits CONNECT.
    pub fn connect(&mut self, info: ConnectInfo<'a>) -> Result<(), T::Error> {
        if info.client_id.is_empty() {
            return Err(Error::InvalidClientId);
        }
        match self.state {
            ConnState::Disconnected => {
                self.info = Some(info);
                self.state = ConnState::Connecting;
                Ok(())
            }
            ConnState::Connecting => Err(Error::AlreadyConnecting),
            ConnState::Connected | ConnState::Disconnecting => Err(Error::AlreadyConnecting),
        }
    }

    /// Requests a non-blocking close of the connection.
    pub fn disconnect(&mut self, transport: &mut T) -> Result<(), T::Error> {
        match self.state {
            ConnState::Disconnected | ConnState::Disconnecting => Err(Error::NotConnected),
            ConnState::Connecting | ConnState::Connected => {
                transport.close();
                self.state = ConnState::Disconnecting;
                Ok(())
            }
        }
    }

    /// Called once the transport becomes usable, after [`Self::connect`] moved the client to
    /// `CONNECTING`. Emits the CONNECT packet.
    pub fn on_active(&mut self, transport: &mut T) -> Result<(), T::Error> {
        if self.state != ConnState::Connecting {
            return Ok(());
        }

        let info = self.info.as_ref().expect("CONNECTING state always carries connect info");
        let will = info.will.map(|w| v311::Will {
            retain: w.retain,
            qos: w.qos,
            topic: w.topic,
            message: w.message,
        });
        let packet = v311::Connect {
            client_id: info.client_id,
            keep_alive: info.keep_alive,
            clean_session: info.clean_session,
            will,
            username: info.username,
            password: info.password,
        };

        match self.encode(&packet) {
            Some(_) => {
                self.flush(transport)?;
                Ok(())
            }
            None => Err(Error::OutOfMemory),
        }
    }

    /// Subscribes to `topic` at the requested [`QoS`], tagging the request with `arg` so the
    /// completion event can be correlated by the application.
    pub fn subscribe(&mut self, transport: &mut T, topic: &str, qos: QoS, arg: usize) -> Result<(), T::Error> {
        self.sub_unsub(transport, topic, Some(qos), arg, true)
    }

    /// Unsubscribes from `topic`, tagging the request with `arg`.
    pub fn unsubscribe(&mut self, transport: &mut T, topic: &str, arg: usize) -> Result<(), T::Error> {
        self.sub_unsub(transport, topic, None, arg, false)
    }

    fn sub_unsub(
        &mut self,
        transport: &mut T,
        topic: &str,
        qos: Option<QoS>,
        arg: usize,
        subscribe: bool,
    ) -> Result<(), T::Error> {
        if self.state != ConnState::Connected {
            return Err(Error::NotConnected);
        }

        let packet_id = self.next_packet_id();
        let written = if subscribe {
            self.encode(&v311::Subscribe {
                packet_id,
                filter: v311::TopicFilter {
                    filter: topic,
                    qos: qos.unwrap_or(QoS::AtMostOnce),
                },
            })
        } else {
            self.encode(&v311::Unsubscribe { packet_id, filter: topic })
        };

        if written.is_none() {
            return Err(Error::OutOfMemory);
        };

        let index = self
            .requests
            .create(packet_id, arg, self.written_total)
            .ok_or(Error::RequestTableFull)?;
        if subscribe {
            self.requests.mark_subscribe(index);
        } else {
            self.requests.mark_unsubscribe(index);
        }
        self.requests.set_pending(index, self.poll_time);

        self.flush(transport)?;
        Ok(())
    }

    /// Publishes `payload` to `topic`. `arg` tags the eventual completion event for QoS 1/2;
    /// for QoS 0 it tags the event emitted once the transport has durably accepted the bytes.
    pub fn publish(
        &mut self,
        transport: &mut T,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
        arg: usize,
    ) -> Result<(), T::Error> {
        if self.state != ConnState::Connected {
            return Err(Error::NotConnected);
        }

        let packet_id = if qos == QoS::AtMostOnce { None } else { Some(self.next_packet_id()) };

        let publish = v311::Publish {
            dup: false,
            qos,
            retain,
            packet_id,
            topic,
            payload,
        };

        self.encode(&publish).ok_or(Error::OutOfMemory)?;

        // QoS 0 has no acknowledgement; the request resolves once `sent_total` reaches the
        // stream position this publish's own bytes end at.
        let index = self
            .requests
            .create(packet_id.unwrap_or(0), arg, self.written_total)
            .ok_or(Error::RequestTableFull)?;
        self.requests.set_pending(index, self.poll_time);

        self.flush(transport)?;
        Ok(())
    }

    /// Feeds inbound bytes delivered by the transport, invoking `on_event` once per surfaced
    /// [`Event`].
    pub fn on_recv(&mut self, transport: &mut T, data: &[u8], mut on_event: impl FnMut(Event<'_>)) -> Result<(), T::Error> {
        self.poll_time = 0;

        let Self {
            tx,
            parser,
            requests,
            state,
            written_total,
            sent_total,
            ..
        } = self;

        let mut dispatch_err = None;
        parser.feed(data, |header, payload| {
            if dispatch_err.is_some() {
                return;
            }
            if let Err(err) = dispatch_one::<T, N>(
                tx,
                requests,
                state,
                written_total,
                sent_total,
                header,
                payload,
                transport,
                &mut on_event,
            ) {
                dispatch_err = Some(err);
            }
        });

        if let Some(err) = dispatch_err {
            return Err(err.into());
        }

        while let Some(arg) = self.requests.complete_zero_qos(self.sent_total) {
            on_event(Event::Publish { arg, res: RequestResult::Ok });
        }

        Ok(())
    }

    /// Called when the transport becomes writable again after an earlier [`Self::flush`] could
    /// not drain the whole tx buffer (`ok == false` signals the send itself failed, which is
    /// fatal for the connection). Retries flushing whatever is left queued and, since that may
    /// complete the byte range a QoS 0 publish was waiting on, resolves any now-sent QoS 0
    /// requests.
    pub fn on_sent(&mut self, transport: &mut T, ok: bool, mut on_event: impl FnMut(Event<'_>)) -> Result<(), T::Error> {
        if !ok {
            transport.close();
            self.close_with_events(&mut on_event);
            return Ok(());
        }

        self.poll_time = 0;
        self.flush(transport)?;

        while let Some(arg) = self.requests.complete_zero_qos(self.sent_total) {
            on_event(Event::Publish { arg, res: RequestResult::Ok });
        }

        Ok(())
    }

    /// Called on the transport's periodic poll tick; drives the keep-alive PINGREQ cadence.
    pub fn on_poll(&mut self, transport: &mut T) -> Result<(), T::Error> {
        self.poll_time += 1;

        let Some(info) = &self.info else { return Ok(()) };
        if self.state != ConnState::Connected || info.keep_alive == 0 {
            return Ok(());
        }

        let elapsed_ms = u64::from(self.poll_time) * u64::from(self.poll_interval_ms);
        if elapsed_ms >= u64::from(info.keep_alive) * 1000 {
            if self.encode(&v311::PingReq).is_some() {
                self.flush(transport)?;
            }
            self.poll_time = 0;
        }

        Ok(())
    }

    /// Called when the transport reports the connection has closed, whether requested locally
    /// or not. Fans out a synthetic failure event to every request still pending.
    pub fn on_close(&mut self, mut on_event: impl FnMut(Event<'_>)) {
        self.close_with_events(&mut on_event);
    }

    /// Called when the transport reports a connection error while `CONNECTING`.
    pub fn on_error(&mut self, mut on_event: impl FnMut(Event<'_>)) {
        if self.state == ConnState::Connecting {
            self.state = ConnState::Disconnected;
            on_event(Event::Connect {
                status: ConnectReturnCode::ServerUnavailable,
            });
            self.reset();
        } else {
            self.close_with_events(&mut on_event);
        }
    }

    fn close_with_events(&mut self, on_event: &mut impl FnMut(Event<'_>)) {
        let prior = self.state;
        self.state = ConnState::Disconnected;

        on_event(Event::Disconnect {
            is_accepted: matches!(prior, ConnState::Connected | ConnState::Disconnecting),
        });

        for slot in self.requests.iter_in_use() {
            if slot.is_subscribe() {
                on_event(Event::Subscribe { arg: slot.arg(), res: RequestResult::Err });
            } else if slot.is_unsubscribe() {
                on_event(Event::Unsubscribe { arg: slot.arg(), res: RequestResult::Err });
            } else {
                on_event(Event::Publish { arg: slot.arg(), res: RequestResult::Err });
            }
        }

        self.reset();
    }

    fn reset(&mut self) {
        self.requests.clear();
        self.tx = TxBuffer::new(self.tx.capacity());
        self.parser.reset();
        self.written_total = 0;
        self.sent_total = 0;
        self.poll_time = 0;
        self.info = None;
    }

    fn next_packet_id(&mut self) -> u16 {
        let id = self.next_packet_id;
        self.next_packet_id = if id == 0xffff { 1 } else { id + 1 };
        id
    }

    /// Pre-checks memory, then encodes `packet`'s fixed header and body atomically, tallying
    /// `written_total`. Returns the bytes written, or `None` if the tx buffer has no room.
    fn encode<P>(&mut self, packet: &P) -> Option<usize>
    where
        P: crate::protocol::Packet + Writable,
    {
        let written = encode_raw(&mut self.tx, packet)?;
        self.written_total += written;
        Some(written)
    }

    /// Hands as much of the queued tx bytes to the transport as it will accept right now.
    fn flush(&mut self, transport: &mut T) -> core::result::Result<(), T::Error> {
        flush_raw(&mut self.tx, transport, &mut self.sent_total)
    }
}

fn handle_publish_ack<T, const N: usize>(
    requests: &mut RequestTable<N>,
    packet_id: u16,
    on_event: &mut dyn FnMut(Event<'_>),
) where
    T: Transport,
{
    match requests.get_pending(packet_id) {
        Some(slot) => {
            on_event(Event::Publish { arg: slot.arg(), res: RequestResult::Ok });
            requests.delete(packet_id);
        }
        None => log::warn_!("protocol violation: ack for unknown packet id {packet_id}"),
    }
}

fn dispatch_one<T, const N: usize>(
    tx: &mut TxBuffer,
    requests: &mut RequestTable<N>,
    state: &mut ConnState,
    written_total: &mut usize,
    sent_total: &mut usize,
    header: u8,
    payload: &[u8],
    transport: &mut T,
    on_event: &mut dyn FnMut(Event<'_>),
) -> core::result::Result<(), T::Error>
where
    T: Transport,
{
    let ty = header >> 4;

    match ty {
        0x02 => {
            // CONNACK
            if *state != ConnState::Connecting {
                log::warn_!("protocol violation: CONNACK received outside CONNECTING");
                return Ok(());
            }
            let Ok((_, connack)) = ConnAck::parse_body(payload) else {
                log::warn_!("dropping malformed CONNACK");
                return Ok(());
            };
            if connack.return_code.is_accepted() {
                *state = ConnState::Connected;
            }
            on_event(Event::Connect { status: connack.return_code });
        }
        0x03 => {
            // PUBLISH
            let Ok((_, publish)) = v311::Publish::parse_body(header & 0x0f, payload) else {
                log::warn_!("dropping malformed PUBLISH");
                return Ok(());
            };

            if let Some(packet_id) = publish.packet_id {
                let written = match publish.qos {
                    QoS::AtLeastOnce => encode_raw(tx, &PubAck { packet_id }),
                    QoS::ExactlyOnce => encode_raw(tx, &PubRec { packet_id }),
                    QoS::AtMostOnce => None,
                };
                if let Some(written) = written {
                    *written_total += written;
                }
                flush_raw(tx, transport, sent_total)?;
            }

            on_event(Event::PublishRecv {
                topic: publish.topic,
                payload: publish.payload,
                dup: publish.dup,
                qos: publish.qos,
            });
        }
        0x05 => {
            // PUBREC: second leg of an outbound QoS-2 publish; request stays pending until PUBCOMP.
            if let Ok((_, pubrec)) = PubRec::parse_body(payload) {
                if let Some(written) = encode_raw(tx, &PubRel { packet_id: pubrec.packet_id }) {
                    *written_total += written;
                }
                flush_raw(tx, transport, sent_total)?;
            }
        }
        0x06 => {
            // PUBREL: respond with PUBCOMP to the inbound publish we already surfaced.
            if let Ok((_, pubrel)) = PubRel::parse_body(payload) {
                if let Some(written) = encode_raw(tx, &PubComp { packet_id: pubrel.packet_id }) {
                    *written_total += written;
                }
                flush_raw(tx, transport, sent_total)?;
            }
        }
        0x04 => {
            // PUBACK: final acknowledgement of an outbound QoS-1 publish.
            if let Ok((_, puback)) = PubAck::parse_body(payload) {
                handle_publish_ack::<T, N>(requests, puback.packet_id, on_event);
            }
        }
        0x07 => {
            // PUBCOMP: final acknowledgement of an outbound QoS-2 publish.
            if let Ok((_, pubcomp)) = PubComp::parse_body(payload) {
                handle_publish_ack::<T, N>(requests, pubcomp.packet_id, on_event);
            }
        }
        0x09 => {
            // SUBACK
            let Ok((_, suback)) = SubAck::parse_body(payload) else {
                log::warn_!("dropping malformed SUBACK");
                return Ok(());
            };
            let res = if suback.result.is_success() { RequestResult::Ok } else { RequestResult::Err };
            match requests.get_pending(suback.packet_id) {
                Some(slot) => {
                    on_event(Event::Subscribe { arg: slot.arg(), res });
                    requests.delete(suback.packet_id);
                }
                None => log::warn_!("protocol violation: SUBACK for unknown packet id {}", suback.packet_id),
            }
        }
        0x0b => {
            // UNSUBACK
            let Ok((_, unsuback)) = UnsubAck::parse_body(payload) else {
                log::warn_!("dropping malformed UNSUBACK");
                return Ok(());
            };
            match requests.get_pending(unsuback.packet_id) {
                Some(slot) => {
                    on_event(Event::Unsubscribe { arg: slot.arg(), res: RequestResult::Ok });
                    requests.delete(unsuback.packet_id);
                }
                None => log::warn_!("protocol violation: UNSUBACK for unknown packet id {}", unsuback.packet_id),
            }
        }
        0x0d => {
            // PINGRESP
            on_event(Event::KeepAlive);
        }
        _ => {
            log::warn_!("ignoring unexpected inbound packet type {ty}");
        }
    }

    Ok(())
}

/// Encodes an unsolicited response packet (PUBACK/PUBREC/PUBREL/PUBCOMP) generated while
/// dispatching an inbound frame. Returns the bytes written, mirroring [`Client::encode`].
fn encode_raw<P>(tx: &mut TxBuffer, packet: &P) -> Option<usize>
where
    P: crate::protocol::Packet + Writable,
{
    let rem_len = packet.size();
    let Ok(length_field) = VariableByteInteger::try_from(rem_len) else {
        log::warn_!("refusing to encode oversized response packet");
        return None;
    };
    let total = 1 + length_field.size() + rem_len;

    if tx.free() < total {
        log::warn_!("no tx buffer space for response packet, dropping it");
        return None;
    }

    let header = FixedHeader::new(P::TYPE, packet.flags(), rem_len);
    let mut sink = TxSink(tx);
    header.write_to(&mut sink);
    packet.write_to(&mut sink);

    Some(total)
}

fn flush_raw<T: Transport>(
    tx: &mut TxBuffer,
    transport: &mut T,
    sent_total: &mut usize,
) -> core::result::Result<(), T::Error> {
    tx.set_sending(true);
    let view = tx.linear_read_view();
    if !view.is_empty() {
        let accepted = transport.send(view)?;
        tx.skip(accepted);
        *sent_total += accepted;
    }
    tx.set_sending(false);
    tx.reset_if_idle();
    Ok(())
}
