use std::sync::mpsc;

use super::*;
use crate::foundation::core::Rgba8;

fn channel_request() -> (CopyOutputRequest, mpsc::Receiver<CopyOutputResult>) {
    let (tx, rx) = mpsc::channel();
    let req = CopyOutputRequest::new(move |result| {
        let _ = tx.send(result);
    });
    (req, rx)
}

#[test]
fn dropping_an_unfulfilled_request_reports_empty() {
    let (req, rx) = channel_request();
    drop(req);
    assert!(rx.recv().unwrap().is_empty());
    assert!(rx.try_recv().is_err());
}

#[test]
fn send_result_delivers_exactly_once() {
    let (req, rx) = channel_request();
    let bitmap = Bitmap::solid(2, 2, Rgba8::WHITE).unwrap();
    req.send_result(CopyOutputResult::Bitmap(bitmap));

    let got = rx.recv().unwrap().into_bitmap().unwrap();
    assert_eq!(got.width(), 2);
    assert!(rx.try_recv().is_err());
}

#[test]
fn area_is_optional() {
    let (req, _rx) = channel_request();
    assert_eq!(req.area(), None);
    let req = req.with_area(IntRect::new(1, 2, 3, 4));
    assert_eq!(req.area(), Some(IntRect::new(1, 2, 3, 4)));
}
