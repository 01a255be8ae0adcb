//! cargo run --example=generate -- 0x30F 0x70010

use adv_password::*;

fn main() {
    let scene = std::env::args()
        .nth(1)
        .expect("Usage: generate <scene> <flags>");
    let flags = std::env::args()
        .nth(2)
        .expect("Usage: generate <scene> <flags>");

    let scene = SceneId::parse(&scene).expect("invalid scene id");
    let flags = FlagData::parse(&flags).expect("invalid flag data");
    let password = Password::from_parts(scene, flags);

    // 同じ値を表す、見た目の異なるパスワードを列挙する。
    let mut rng = rand::thread_rng();
    for _ in 0..8 {
        println!("{}", password.randomized(&mut rng));
    }
}
