use bytes::Bytes;

use redis_cache::blocker::Blocker;
use redis_cache::commands::{process_blpop, process_llen, process_lrange, process_pop, process_push};
use redis_cache::keyspace::Keyspace;
use redis_cache::models::ListDir;

fn parts(args: &[&str]) -> Vec<Bytes> {
    args.iter().map(|s| Bytes::from(s.to_string())).collect()
}

// ==================== RPUSH / LPUSH ====================

#[test]
fn rpush_then_lrange_round_trip() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["RPUSH", "l", "a", "b", "c"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = process_lrange(&parts(&["LRANGE", "l", "0", "-1"]), &mut keyspace.lock()).unwrap();
    assert_eq!(r, b"*3\r\n$1\r\na\r\n$1\r\nb\r\n$1\r\nc\r\n");
}

#[test]
fn lpush_prepends_each_argument_in_order() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["LPUSH", "l", "a", "b", "c"]), &mut keyspace.lock(), &blocker, ListDir::L).unwrap();
    let r = process_lrange(&parts(&["LRANGE", "l", "0", "-1"]), &mut keyspace.lock()).unwrap();
    assert_eq!(r, b"*3\r\n$1\r\nc\r\n$1\r\nb\r\n$1\r\na\r\n");
}

#[test]
fn push_reports_the_resulting_length() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    let r = process_push(&parts(&["RPUSH", "l", "a", "b"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    assert_eq!(r, b":2\r\n");
    let r = process_push(&parts(&["RPUSH", "l", "c"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    assert_eq!(r, b":3\r\n");
}

#[test]
fn push_against_a_string_key_is_wrongtype_and_leaves_it_untouched() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    use redis_cache::models::{RedisData, RedisValue};
    keyspace.lock().insert("k".to_string(), RedisValue::new(RedisData::String(Bytes::from("v")), None));
    let r = process_push(&parts(&["RPUSH", "k", "x"]), &mut keyspace.lock(), &blocker, ListDir::R);
    assert!(r.unwrap_err().contains("WRONGTYPE"));
    match &keyspace.lock().get("k").unwrap().data {
        RedisData::String(s) => assert_eq!(s, &Bytes::from("v")),
        _ => panic!("key type changed"),
    }
}

#[test]
fn push_against_a_wrongtype_key_never_hands_off_to_a_blocked_waiter() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    use redis_cache::models::{RedisData, RedisValue};
    keyspace.lock().insert("k".to_string(), RedisValue::new(RedisData::String(Bytes::from("v")), None));
    let (_token, mut rx) = blocker.register(&["k".to_string()]);
    let r = process_push(&parts(&["RPUSH", "k", "x"]), &mut keyspace.lock(), &blocker, ListDir::R);
    assert!(r.is_err());
    assert!(rx.try_recv().is_err());
}

// ==================== LRANGE ====================

#[test]
fn lrange_negative_indices_count_from_the_end() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["RPUSH", "l", "a", "b", "c", "d"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = process_lrange(&parts(&["LRANGE", "l", "-2", "-1"]), &mut keyspace.lock()).unwrap();
    assert_eq!(r, b"*2\r\n$1\r\nc\r\n$1\r\nd\r\n");
}

#[test]
fn lrange_on_missing_key_is_an_empty_array() {
    let keyspace = Keyspace::new();
    let r = process_lrange(&parts(&["LRANGE", "nope", "0", "-1"]), &mut keyspace.lock()).unwrap();
    assert_eq!(r, b"*0\r\n");
}

#[test]
fn lrange_start_past_end_is_empty() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["RPUSH", "l", "a"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = process_lrange(&parts(&["LRANGE", "l", "5", "10"]), &mut keyspace.lock()).unwrap();
    assert_eq!(r, b"*0\r\n");
}

// ==================== LLEN ====================

#[test]
fn llen_of_missing_key_is_zero() {
    let keyspace = Keyspace::new();
    assert_eq!(process_llen(&parts(&["LLEN", "nope"]), &mut keyspace.lock()).unwrap(), b":0\r\n");
}

#[test]
fn llen_reflects_current_size() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["RPUSH", "l", "a", "b"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    assert_eq!(process_llen(&parts(&["LLEN", "l"]), &mut keyspace.lock()).unwrap(), b":2\r\n");
}

// ==================== LPOP / RPOP ====================

#[test]
fn lpop_with_count_drains_front() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["RPUSH", "l", "a", "b", "c"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = process_pop(&parts(&["LPOP", "l", "2"]), &mut keyspace.lock(), ListDir::L).unwrap();
    assert_eq!(r, b"*2\r\n$1\r\na\r\n$1\r\nb\r\n");
}

#[test]
fn lpop_without_count_returns_a_single_bulk_string() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["RPUSH", "l", "a", "b"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = process_pop(&parts(&["LPOP", "l"]), &mut keyspace.lock(), ListDir::L).unwrap();
    assert_eq!(r, b"$1\r\na\r\n");
}

#[test]
fn rpop_pops_from_the_tail() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["RPUSH", "l", "a", "b", "c"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = process_pop(&parts(&["RPOP", "l"]), &mut keyspace.lock(), ListDir::R).unwrap();
    assert_eq!(r, b"$1\r\nc\r\n");
}

#[test]
fn pop_on_missing_key_is_nil() {
    let keyspace = Keyspace::new();
    assert_eq!(process_pop(&parts(&["LPOP", "nope"]), &mut keyspace.lock(), ListDir::L).unwrap(), b"$-1\r\n");
    assert_eq!(process_pop(&parts(&["LPOP", "nope", "3"]), &mut keyspace.lock(), ListDir::L).unwrap(), b"*-1\r\n");
}

#[test]
fn pop_draining_the_list_removes_the_key() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["RPUSH", "l", "a"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    process_pop(&parts(&["LPOP", "l"]), &mut keyspace.lock(), ListDir::L).unwrap();
    assert!(keyspace.lock().get("l").is_none());
}

// ==================== BLPOP ====================

#[tokio::test]
async fn blpop_returns_immediately_when_the_list_is_already_non_empty() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    process_push(&parts(&["RPUSH", "q", "v"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = process_blpop(&parts(&["BLPOP", "q", "0"]), &keyspace, &blocker).await.unwrap();
    assert_eq!(r, b"*2\r\n$1\r\nq\r\n$1\r\nv\r\n");
}

#[tokio::test]
async fn blpop_receives_handed_off_push_without_touching_the_list() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();

    let blpop = process_blpop(&parts(&["BLPOP", "q", "0.2"]), &keyspace, &blocker);
    tokio::pin!(blpop);
    tokio::select! {
        _ = &mut blpop => panic!("blpop resolved before any push"),
        _ = tokio::time::sleep(tokio::time::Duration::from_millis(10)) => {}
    }
    process_push(&parts(&["RPUSH", "q", "v"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = blpop.await.unwrap();
    assert_eq!(r, b"*2\r\n$1\r\nq\r\n$1\r\nv\r\n");
    assert_eq!(process_llen(&parts(&["LLEN", "q"]), &mut keyspace.lock()).unwrap(), b":0\r\n");
}

#[tokio::test]
async fn blpop_times_out_with_a_null_array_when_nothing_arrives() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();
    let r = process_blpop(&parts(&["BLPOP", "q", "0.05"]), &keyspace, &blocker).await.unwrap();
    assert_eq!(r, b"*-1\r\n");
}

#[tokio::test]
async fn blpop_on_multiple_keys_wakes_on_whichever_key_is_pushed() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();

    let blpop = process_blpop(&parts(&["BLPOP", "k1", "k2", "0.2"]), &keyspace, &blocker);
    tokio::pin!(blpop);
    tokio::select! {
        _ = &mut blpop => panic!("blpop resolved before any push"),
        _ = tokio::time::sleep(tokio::time::Duration::from_millis(10)) => {}
    }
    process_push(&parts(&["RPUSH", "k2", "v2"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = blpop.await.unwrap();
    assert_eq!(r, b"*2\r\n$2\r\nk2\r\n$2\r\nv2\r\n");
}

#[tokio::test]
async fn blpop_unregisters_on_wake_so_a_later_push_on_another_key_is_not_lost() {
    let keyspace = Keyspace::new();
    let blocker = Blocker::new();

    process_push(&parts(&["RPUSH", "k1", "first"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    let r = process_blpop(&parts(&["BLPOP", "k1", "k2", "0"]), &keyspace, &blocker).await.unwrap();
    assert_eq!(r, b"*2\r\n$2\r\nk1\r\n$5\r\nfirst\r\n");

    // k2 was registered too; pushing to it afterward must behave like an
    // ordinary push, not a silently dropped handoff.
    process_push(&parts(&["RPUSH", "k2", "second"]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
    assert_eq!(process_llen(&parts(&["LLEN", "k2"]), &mut keyspace.lock()).unwrap(), b":1\r\n");
}

// ==================== Concurrency ====================

#[tokio::test]
async fn concurrent_pushes_and_pops_never_lose_or_duplicate_elements() {
    use std::sync::Arc;

    let keyspace = Arc::new(Keyspace::new());
    let blocker = Arc::new(Blocker::new());

    let mut pushers = Vec::new();
    for worker in 0..10 {
        let keyspace = Arc::clone(&keyspace);
        let blocker = Arc::clone(&blocker);
        pushers.push(tokio::spawn(async move {
            for i in 0..20 {
                let value = format!("w{worker}-{i}");
                process_push(&parts(&["RPUSH", "shared", &value]), &mut keyspace.lock(), &blocker, ListDir::R).unwrap();
            }
        }));
    }
    for p in pushers {
        p.await.unwrap();
    }

    assert_eq!(process_llen(&parts(&["LLEN", "shared"]), &mut keyspace.lock()).unwrap(), b":200\r\n");
}
