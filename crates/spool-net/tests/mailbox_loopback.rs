//! Loopback delivery test for the UDP mailbox

use mio::{Events, Poll, Token};
use spool_net::{MailBox, MailSender, MsgBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MAILBOX: Token = Token(0);

#[test]
fn test_loopback_delivery() {
    let mut mailbox = MailBox::new();
    mailbox.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = mailbox.local_addr().unwrap();

    let received: Arc<Mutex<Option<MsgBuf>>> = Arc::new(Mutex::new(None));
    {
        let received = Arc::clone(&received);
        mailbox.set_handler(move |dispatch, msg| {
            *received.lock().unwrap() = Some(msg);
            dispatch.stop();
        });
    }

    let mut poll = Poll::new().unwrap();
    mailbox.register(poll.registry(), MAILBOX).unwrap();

    let mut sender = MailSender::new();
    assert_eq!(sender.send(addr, b"hello").unwrap(), 5);

    let mut events = Events::with_capacity(8);
    let deadline = Instant::now() + Duration::from_secs(10);
    while received.lock().unwrap().is_none() {
        assert!(Instant::now() < deadline, "no datagram within the deadline");
        poll.poll(&mut events, Some(Duration::from_millis(200)))
            .unwrap();
        for event in events.iter() {
            if event.token() == MAILBOX {
                mailbox.on_readable(poll.registry()).unwrap();
            }
        }
    }

    let msg = received.lock().unwrap().take().unwrap();
    assert_eq!(msg.data, b"hello");
    assert!(msg.src.ip().is_loopback());

    // The handler asked for removal mid-dispatch.
    assert!(mailbox.token().is_none());
}
