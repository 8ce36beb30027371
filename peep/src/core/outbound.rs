use log::{debug, warn};
use peep_msg::{Code, Payload, TryIntoBytes, Type};
use toad_array::{AppendCopy, Reserve};

use super::*;
use crate::journal::Handle;
use crate::link::{Frame, FrameBody, FRAME_MARKER};
use crate::retry::YouShould;

fn copy_payload<P: PlatformTypes>(bytes: &[u8]) -> P::MessagePayload {
  let mut payload = P::MessagePayload::reserve(bytes.len());
  payload.append_copy(bytes);
  payload
}

impl<P: PlatformTypes> Core<P> {
  /// GET a path on a remote node.
  ///
  /// The request is confirmable: it is retransmitted with exponential
  /// backoff until acknowledged or until
  /// [`Config::con`](crate::config::Con) runs out of attempts.
  /// `on_done` fires exactly once, with the response, the peer's reset,
  /// or [`Outcome::Abandoned`].
  pub fn get(&mut self, to: NodeId, path: &str, on_done: ResponseHandler<P>) -> Result<Token, Error<P>> {
    self.request(Type::Con, Code::GET, to, path, &[], on_done)
  }

  /// POST a payload to a path on a remote node.
  pub fn post(&mut self,
              to: NodeId,
              path: &str,
              payload: &[u8],
              on_done: ResponseHandler<P>)
              -> Result<Token, Error<P>> {
    self.request(Type::Con, Code::POST, to, path, payload, on_done)
  }

  /// PUT a payload to a path on a remote node.
  pub fn put(&mut self,
             to: NodeId,
             path: &str,
             payload: &[u8],
             on_done: ResponseHandler<P>)
             -> Result<Token, Error<P>> {
    self.request(Type::Con, Code::PUT, to, path, payload, on_done)
  }

  /// DELETE a path on a remote node.
  pub fn delete(&mut self, to: NodeId, path: &str, on_done: ResponseHandler<P>) -> Result<Token, Error<P>> {
    self.request(Type::Con, Code::DELETE, to, path, &[], on_done)
  }

  /// Send a request with full control over type, method and payload.
  ///
  /// Non-confirmable requests are journaled for response correlation
  /// but never retransmitted.
  pub fn request(&mut self,
                 ty: Type,
                 code: Code,
                 to: NodeId,
                 path: &str,
                 payload: &[u8],
                 on_done: ResponseHandler<P>)
                 -> Result<Token, Error<P>> {
    let id = self.next_id();
    let token = self.next_token();
    let when = When::SendingMessage(to, id);

    let mut msg = Message::<P>::new(ty, code, id);
    msg.opts
       .set_uri_path(path)
       .and_then(|_| msg.opts.set_token(token))
       .map_err(|e| when.what(What::Option(e)))?;
    msg.payload = Payload(copy_payload::<P>(payload));

    let msg = Addrd(msg, to);
    self.send_msg(&msg)?;

    let backoff = Backoff::new(self.config.con.retry_strategy,
                               self.config.con.max_attempts,
                               &mut self.rand);
    let confirmable = ty == Type::Con;

    if self.sent.is_full() {
      warn!("sent-journal full; evicting the oldest exchange");
    }

    let handle = self.sent.push(SentRecord { msg,
                                             backoff,
                                             acked: !confirmable,
                                             on_done: Some(on_done) });

    if confirmable {
      self.timer
          .schedule(backoff.first_delay(), TimerEvent::Retransmit(handle))
          .map_err(|e| when.what(What::TimerError(e)))?;
    }

    Ok(token)
  }

  /// Answer a request previously handed to a resource handler.
  ///
  /// Before the deferred-ACK timer fires the response rides along with
  /// the ACK (piggyback); after it, the response goes out as a fresh
  /// confirmable message with its own retransmission timer. Replies to
  /// non-confirmable requests are non-confirmable.
  pub fn reply(&mut self, req: &Addrd<Message<P>>, code: Code, payload: &[u8]) -> Result<(), Error<P>> {
    let (to, req_id) = (req.addr(), req.data().id);
    let when = When::SendingMessage(to, req_id);

    let found = self.recvd
                    .iter()
                    .find(|(_, r)| r.from == to && r.id == req_id)
                    .map(|(handle, r)| (handle, r.ty, r.ack_sent));

    let (handle, req_ty, ack_sent) = found.ok_or(when.what(What::ExchangeGone(req_id)))?;

    let (ty, id) = match (req_ty, ack_sent) {
      | (Type::Con, false) => (Type::Ack, req_id),
      | (Type::Con, true) => (Type::Con, self.next_id()),
      | _ => (Type::Non, self.next_id()),
    };

    let mut msg = Message::<P>::new(ty, code, id);
    if let Some(token) = req.data().token() {
      msg.opts
         .set_token(token)
         .map_err(|e| when.what(What::Option(e)))?;
    }
    msg.payload = Payload(copy_payload::<P>(payload));

    let msg = Addrd(msg, to);
    self.send_msg(&msg)?;

    if let Some(rec) = self.recvd.get_mut(handle) {
      if ty == Type::Ack {
        rec.ack_sent = true;
      }
      rec.reply = Some(msg.data().clone());
    }

    if ty == Type::Con {
      let backoff = Backoff::new(self.config.con.retry_strategy,
                                 self.config.con.max_attempts,
                                 &mut self.rand);

      if self.sent.is_full() {
        warn!("sent-journal full; evicting the oldest exchange");
      }

      let handle = self.sent.push(SentRecord { msg,
                                               backoff,
                                               acked: false,
                                               on_done: None });

      self.timer
          .schedule(backoff.first_delay(), TimerEvent::Retransmit(handle))
          .map_err(|e| when.what(What::TimerError(e)))?;
    }

    Ok(())
  }

  /// Tell `to` that we cannot correlate message `id` with anything.
  pub fn rst(&mut self, to: NodeId, id: Id) -> Result<(), Error<P>> {
    self.send_msg(&Addrd(Message::<P>::new(Type::Reset, Code::EMPTY, id), to))
  }

  /// Serialize a message, put the protocol marker in front of it, and
  /// hand the frame to the radio.
  pub(crate) fn send_msg(&mut self, msg: &Addrd<Message<P>>) -> Result<(), Error<P>> {
    let when = When::SendingMessage(msg.addr(), msg.data().id);

    let body = msg.data()
                  .clone()
                  .try_into_bytes::<FrameBody>()
                  .map_err(|e| when.what(What::ToBytes(e)))?;

    let mut frame = Frame::default();
    frame.push(FRAME_MARKER);
    frame.extend_from_slice(&body);

    nb::block!(self.radio.send(Addrd(&frame, msg.addr()))).map_err(|e| {
                                                            when.what(What::RadioError(e))
                                                          })
  }

  /// The deferred-ACK grace period for a received CON request elapsed.
  ///
  /// If nothing has answered the request yet, a bare ACK goes out now
  /// and any later reply becomes a separate confirmable response.
  pub(crate) fn ack_due(&mut self, handle: Handle) -> Result<(), Error<P>> {
    let due = match self.recvd.get_mut(handle) {
      | Some(rec) if !rec.ack_sent && rec.reply.is_none() => {
        rec.ack_sent = true;
        Some((rec.from, rec.id))
      },
      // replied, already acked, or evicted; stale timers die here
      | _ => None,
    };

    match due {
      | Some((to, id)) => self.send_msg(&Addrd(Message::<P>::new(Type::Ack, Code::EMPTY, id), to)),
      | None => Ok(()),
    }
  }

  /// A retransmission timer fired.
  pub(crate) fn retransmit_due(&mut self, handle: Handle) -> Result<(), Error<P>> {
    let decision = match self.sent.get_mut(handle) {
      | Some(rec) if !rec.acked => Some(rec.backoff.what_should_i_do()),
      // acked, completed, or evicted; nothing left to retransmit
      | _ => None,
    };

    match decision {
      | None => Ok(()),
      | Some(YouShould::Retry(delay)) => {
        let msg = match self.sent.get(handle) {
          | Some(rec) => rec.msg.clone(),
          | None => return Ok(()),
        };

        debug!("retransmitting {:?} to {:?}", msg.data().id, msg.addr());
        self.send_msg(&msg)?;
        self.timer
            .schedule(delay, TimerEvent::Retransmit(handle))
            .map_err(|e| {
              When::SendingMessage(msg.addr(), msg.data().id).what(What::TimerError(e))
            })
      },
      | Some(YouShould::Cry) => {
        if let Some(rec) = self.sent.remove(handle) {
          warn!("abandoning exchange {:?} with {:?}: out of retransmissions",
                rec.msg.data().id,
                rec.msg.addr());
          if let Some(mut on_done) = rec.on_done {
            on_done(Outcome::Abandoned);
          }
        }
        Ok(())
      },
    }
  }
}
