#![allow(dead_code)]

pub mod douyin_server;
