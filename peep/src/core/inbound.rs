use log::{debug, trace, warn};
use peep_msg::{Code, CodeKind, TryFromBytes, Type};

use super::*;
use crate::journal::Handle;
use crate::link::FRAME_MARKER;

impl<P: PlatformTypes> Core<P> {
  /// Process one frame delivered by the radio.
  ///
  /// Frames that are not ours (wrong marker, our own broadcasts) and
  /// frames that do not decode are dropped silently; a malformed peer
  /// must not be able to wedge the engine.
  pub fn frame_recvd(&mut self, frame: Addrd<&[u8]>) -> Result<(), Error<P>> {
    let Addrd(bytes, from) = frame;

    if bytes.first() != Some(&FRAME_MARKER) {
      trace!("ignoring frame from {:?}: not coap", from);
      return Ok(());
    }

    if from == self.radio.id() {
      return Ok(());
    }

    let msg = match Message::<P>::try_from_bytes(&bytes[1..]) {
      | Ok(msg) => Addrd(msg, from),
      | Err(e) => {
        debug!("dropping undecodable frame from {:?}: {:?}", from, e);
        return Ok(());
      },
    };

    match (msg.data().ty, msg.data().code.kind()) {
      | (Type::Ack, _) => self.ack_recvd(msg),
      | (Type::Reset, _) => self.reset_recvd(msg),
      | (_, CodeKind::Request) => self.request_recvd(msg),
      | (_, CodeKind::Response) => self.response_recvd(msg, None),
      | (ty, kind) => {
        trace!("dropping {:?} {:?} from {:?}", ty, kind, from);
        Ok(())
      },
    }
  }

  /// The correspondent acknowledged one of our confirmable messages
  /// (and possibly piggybacked the response on it).
  fn ack_recvd(&mut self, msg: Addrd<Message<P>>) -> Result<(), Error<P>> {
    let found = self.sent
                    .iter()
                    .find(|(_, r)| r.msg.addr() == msg.addr() && r.msg.data().id == msg.data().id)
                    .map(|(handle, _)| handle);

    let candidate = match found {
      | None => {
        trace!("ACK from {:?} for an exchange we no longer track", msg.addr());
        None
      },
      | Some(handle) => {
        let we_sent_a_response = match self.sent.get_mut(handle) {
          | Some(rec) => {
            rec.acked = true;
            rec.msg.data().is_response()
          },
          | None => false,
        };

        if we_sent_a_response {
          // the exchange we were serving is complete
          self.sent.remove(handle);
          None
        } else {
          Some(handle)
        }
      },
    };

    if msg.data().is_response() {
      self.response_recvd(msg, candidate)
    } else {
      Ok(())
    }
  }

  /// The correspondent could not process a message we sent.
  fn reset_recvd(&mut self, msg: Addrd<Message<P>>) -> Result<(), Error<P>> {
    let found = self.sent
                    .iter()
                    .find(|(_, r)| r.msg.addr() == msg.addr() && r.msg.data().id == msg.data().id)
                    .map(|(handle, _)| handle);

    if let Some(handle) = found {
      if let Some(rec) = self.sent.remove(handle) {
        warn!("{:?} reset exchange {:?}", msg.addr(), msg.data().id);
        if let Some(mut on_done) = rec.on_done {
          on_done(Outcome::Reset);
        }
      }
    }

    Ok(())
  }

  /// A request arrived. Retransmissions of a request we have already
  /// seen are answered with whatever was already produced for it — the
  /// handler does not run twice.
  fn request_recvd(&mut self, req: Addrd<Message<P>>) -> Result<(), Error<P>> {
    let (from, id) = (req.addr(), req.data().id);

    let dup = self.recvd
                  .iter()
                  .find(|(_, r)| r.from == from && r.id == id)
                  .map(|(_, r)| (r.ty, r.ack_sent, r.reply.clone()));

    if let Some((ty, ack_sent, reply)) = dup {
      debug!("duplicate request {:?} from {:?}", id, from);
      return self.resend_produced(from, id, ty, ack_sent, reply);
    }

    if self.recvd.is_full() {
      warn!("received-journal full; evicting the oldest exchange");
    }

    let handle = self.recvd.push(ReceivedRecord { from,
                                                  id,
                                                  ty: req.data().ty,
                                                  ack_sent: false,
                                                  reply: None });

    if req.data().ty == Type::Con {
      self.timer
          .schedule(self.config.ack_delay, TimerEvent::AckDue(handle))
          .map_err(|e| When::ReceivingFrame(from).what(What::TimerError(e)))?;
    }

    let matched = self.resources.dispatch(&req);

    if matched == 0 {
      debug!("nothing serves {:?}; 4.04", req.data().opts.uri_path());
      self.reply(&req, Code::NOT_FOUND, &[])?;
    }

    Ok(())
  }

  /// Answer a retransmitted request with the bytes its first
  /// transmission already produced.
  fn resend_produced(&mut self,
                     to: NodeId,
                     id: Id,
                     ty: Type,
                     ack_sent: bool,
                     reply: Option<Message<P>>)
                     -> Result<(), Error<P>> {
    match reply {
      // the reply rode along with the ACK; one message covers both
      | Some(reply) if reply.ty == Type::Ack => self.send_msg(&Addrd(reply, to)),
      // separate response: a fresh ACK plus the identical response,
      // without arming any new retransmission timer
      | Some(reply) if ty == Type::Con => {
        self.send_msg(&Addrd(Message::<P>::new(Type::Ack, Code::EMPTY, id), to))?;
        self.send_msg(&Addrd(reply, to))
      },
      | Some(reply) => self.send_msg(&Addrd(reply, to)),
      | None if ack_sent => {
        self.send_msg(&Addrd(Message::<P>::new(Type::Ack, Code::EMPTY, id), to))
      },
      // nothing produced yet; the deferred-ACK timer or the
      // application's reply will answer
      | None => Ok(()),
    }
  }

  /// Correlate a response with the request it answers and hand it to
  /// the caller's continuation.
  ///
  /// `candidate` carries the record already matched by message id when
  /// the response arrived piggybacked on an ACK.
  fn response_recvd(&mut self,
                    msg: Addrd<Message<P>>,
                    candidate: Option<Handle>)
                    -> Result<(), Error<P>> {
    let token = match msg.data().token() {
      | Some(token) => token,
      | None => {
        return match msg.data().ty {
          | Type::Con => self.rst(msg.addr(), msg.data().id),
          | _ => Ok(()),
        };
      },
    };

    let found = candidate.or_else(|| {
                           self.sent
                               .iter()
                               .find(|(_, r)| r.msg.data().token() == Some(token))
                               .map(|(handle, _)| handle)
                         });

    match found {
      | Some(handle) => {
        let (to, id, ty) = (msg.addr(), msg.data().id, msg.data().ty);

        if let Some(rec) = self.sent.remove(handle) {
          if let Some(mut on_done) = rec.on_done {
            on_done(Outcome::Response(msg));
          }
        }

        // stop a confirmable response from being retransmitted at us
        if ty == Type::Con {
          self.send_msg(&Addrd(Message::<P>::new(Type::Ack, Code::EMPTY, id), to))?;
        }

        Ok(())
      },
      // we cannot correlate this; a confirmable sender is told so, a
      // non-confirmable one is not worth a frame
      | None if msg.data().ty == Type::Con => self.rst(msg.addr(), msg.data().id),
      | None => {
        trace!("dropping unmatched response from {:?}", msg.addr());
        Ok(())
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use core::cell::Cell;
  use std::rc::Rc;

  use peep_msg::{Id, Token};

  use super::*;
  use crate::test::{self, decode_sent, frame};

  #[test]
  fn foreign_and_own_frames_are_ignored() {
    let mut core = test::core();

    // not our marker
    core.frame_recvd(Addrd(&[0xAB, 0x50, 0x00, 0x00, 0x00], test::PEER))
        .unwrap();
    // our marker, our own node id
    core.frame_recvd(Addrd(&[FRAME_MARKER, 0x50, 0x00, 0x00, 0x00], test::SELF))
        .unwrap();
    // our marker, not decodable
    core.frame_recvd(Addrd(&[FRAME_MARKER, 0x50], test::PEER))
        .unwrap();

    assert!(core.radio.tx.is_empty());
    assert!(core.timer.scheduled.is_empty());
  }

  #[test]
  fn unknown_con_request_gets_piggybacked_404_once() {
    let mut core = test::core();
    let req = test::con_get(Id(9), &[0x01], "nowhere");
    let bytes = frame(&req);

    core.frame_recvd(Addrd(&bytes, test::PEER)).unwrap();
    core.frame_recvd(Addrd(&bytes, test::PEER)).unwrap();

    // one 4.04 when first seen, the identical bytes when retransmitted
    assert_eq!(core.radio.tx.len(), 2);
    assert_eq!(core.radio.tx[0], core.radio.tx[1]);

    let rep = decode_sent(&core.radio.tx[0]);
    assert_eq!(rep.ty, Type::Ack);
    assert_eq!(rep.code, Code::NOT_FOUND);
    assert_eq!(rep.id, Id(9));
    assert_eq!(rep.token(), Some(Token(tinyvec::array_vec!([u8; 8] => 0x01))));
  }

  #[test]
  fn handler_fires_once_across_retransmits() {
    let mut core = test::core();
    let count = Rc::new(Cell::new(0u32));
    let c = count.clone();
    core.register_resource("temp", Box::new(move |_| c.set(c.get() + 1)))
        .unwrap();

    let bytes = frame(&test::con_get(Id(4), &[0x02], "temp"));
    core.frame_recvd(Addrd(&bytes, test::PEER)).unwrap();
    core.frame_recvd(Addrd(&bytes, test::PEER)).unwrap();
    core.frame_recvd(Addrd(&bytes, test::PEER)).unwrap();

    assert_eq!(count.get(), 1);
    // nothing produced yet, so the retransmits get no answer either
    assert!(core.radio.tx.is_empty());
    // and only the first arrival armed the deferred-ACK timer
    assert_eq!(core.timer.scheduled.len(), 1);
  }

  #[test]
  fn non_request_dispatches_without_ack_machinery() {
    let mut core = test::core();
    let count = Rc::new(Cell::new(0u32));
    let c = count.clone();
    core.register_resource("temp", Box::new(move |_| c.set(c.get() + 1)))
        .unwrap();

    let mut req = test::con_get(Id(5), &[0x03], "temp");
    req.ty = Type::Non;
    core.frame_recvd(Addrd(&frame(&req), test::PEER)).unwrap();

    assert_eq!(count.get(), 1);
    assert!(core.timer.scheduled.is_empty());
    assert!(core.radio.tx.is_empty());
  }

  #[test]
  fn subtree_fan_out_invokes_every_match() {
    let mut core = test::core();
    let count = Rc::new(Cell::new(0u32));
    let (a, b) = (count.clone(), count.clone());
    core.register_resource("storage", Box::new(move |_| a.set(a.get() + 1)))
        .unwrap();
    core.register_resource("storage/mote1", Box::new(move |_| b.set(b.get() + 1)))
        .unwrap();

    let bytes = frame(&test::con_get(Id(6), &[0x04], "storage/mote1"));
    core.frame_recvd(Addrd(&bytes, test::PEER)).unwrap();

    assert_eq!(count.get(), 2);
    // something matched, so no 4.04 went out
    assert!(core.radio.tx.is_empty());
  }

  #[test]
  fn unmatched_con_response_is_reset() {
    let mut core = test::core();

    let mut rep = test::con_get(Id(40), &[0x0F], "");
    rep.code = Code::CONTENT;
    core.frame_recvd(Addrd(&frame(&rep), test::PEER)).unwrap();

    let rst = decode_sent(&core.radio.tx[0]);
    assert_eq!(rst.ty, Type::Reset);
    assert_eq!(rst.code, Code::EMPTY);
    assert_eq!(rst.id, Id(40));
  }

  #[test]
  fn unmatched_non_response_is_dropped() {
    let mut core = test::core();

    let mut rep = test::con_get(Id(41), &[0x0F], "");
    rep.ty = Type::Non;
    rep.code = Code::CONTENT;
    core.frame_recvd(Addrd(&frame(&rep), test::PEER)).unwrap();

    assert!(core.radio.tx.is_empty());
  }

  #[test]
  fn con_response_without_token_is_reset() {
    let mut core = test::core();

    let mut rep = test::message(Type::Con, Code::CONTENT, Id(42));
    rep.payload = peep_msg::Payload(b"data".to_vec());
    core.frame_recvd(Addrd(&frame(&rep), test::PEER)).unwrap();

    let rst = decode_sent(&core.radio.tx[0]);
    assert_eq!(rst.ty, Type::Reset);
    assert_eq!(rst.id, Id(42));
  }

  #[test]
  fn reserved_code_is_dropped() {
    let mut core = test::core();

    let msg = test::message(Type::Con, Code::new(1, 0), Id(43));
    core.frame_recvd(Addrd(&frame(&msg), test::PEER)).unwrap();

    assert!(core.radio.tx.is_empty());
  }

  #[test]
  fn received_journal_eviction_forgets_oldest_exchange() {
    let mut core = test::core();

    let first = frame(&test::con_get(Id(0), &[0x00], "nowhere"));
    core.frame_recvd(Addrd(&first, test::PEER)).unwrap();
    assert_eq!(core.radio.tx.len(), 1);

    for n in 1..=(RECVD_CAPACITY as u16) {
      let bytes = frame(&test::con_get(Id(n), &[n as u8], "nowhere"));
      core.frame_recvd(Addrd(&bytes, test::PEER)).unwrap();
    }

    // id 0 was evicted, so its "retransmission" is processed as new
    // rather than answered from the journal
    let count = core.radio.tx.len();
    core.frame_recvd(Addrd(&first, test::PEER)).unwrap();
    assert_eq!(core.radio.tx.len(), count + 1);

    let rep = decode_sent(core.radio.tx.last().unwrap());
    assert_eq!(rep.code, Code::NOT_FOUND);
  }
}
