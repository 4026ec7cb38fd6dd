//! Compact stroke glyph set covering printable ASCII, in the classic
//! char-pair encoding: every byte is a coordinate relative to `'R'`, the
//! leading pair is the left/right advance bounds, and `" R"` lifts the
//! pen between strokes.

/// First encoded character (space).
pub const FIRST_CHAR: char = ' ';

/// Glyphs for `' '..='~'`, indexed by `char as usize - FIRST_CHAR`.
pub const GLYPH_DATA: [&str; 95] = [
    "JZ",                                                         // space
    "OURFRV RRYR[",                                               // !
    "NVPFPK RTFTK",                                               // "
    "JZPFN[ RVFT[ RLMXM RLTXT",                                   // #
    "I[LWOYUYXVXSUQOQLNLKOIUIXK RRFR[",                           // $
    "I[YFK[ RNFPHPKNMLMJKJHLFNF RVTXTZVZYX[V[TYTVVT",             // %
    "I[YRR[N[KXKUSMSIPFMIMLY[",                                   // &
    "PTRFRK",                                                     // '
    "NVTDPJPYT_",                                                 // (
    "NVPDTJTYP_",                                                 // )
    "KYRIRS RNKVQ RVKNQ",                                         // *
    "JZRLRX RLRXR",                                               // +
    "OUSYS[Q^",                                                   // ,
    "JZMRWR",                                                     // -
    "OURYR[",                                                     // .
    "JZXFL_",                                                     // /
    "I[OFUFXJXWU[O[LWLJOF RLWXJ",                                 // 0
    "I[OJRFR[ RN[V[",                                             // 1
    "I[LIOFUFXIXLL[X[",                                           // 2
    "I[LFXFRNVNXQXWU[O[LX",                                       // 3
    "I[T[TFLTXT",                                                 // 4
    "I[XFLFLOTOXRXWT[O[LX",                                       // 5
    "I[WFPFLKLWP[T[XWXRTOLO",                                     // 6
    "I[LFXFQ[",                                                   // 7
    "I[OFUFXIXLUOOOLLLIOF ROOLRLXO[U[XXXRUO",                     // 8
    "I[M[T[XVXJTFPFLJLOPRXR",                                     // 9
    "OURNRP RRYR[",                                               // :
    "OURNRP RSYS[Q^",                                             // ;
    "JZXHLQXZ",                                                   // <
    "JZLOXO RLUXU",                                               // =
    "JZLHXQLZ",                                                   // >
    "KYMIPFTFWIWLRPRT RRYR[",                                     // ?
    "I[WNULQLONOTQVUVWT RWLWTYVZSZNWHRFNFJJJUNYTY",               // @
    "I[K[RFY[ RNSVS",                                             // A
    "I[LFL[ RLFVFXHXNVPLP RVPXRXYV[L[",                           // B
    "I[YHVFNFKIKXN[V[YY",                                         // C
    "I[LFL[ RLFTFXJXWT[L[",                                       // D
    "JZXFLFL[X[ RLPUP",                                           // E
    "JZXFLFL[ RLPUP",                                             // F
    "I[YHVFNFKIKXN[V[YXYRTR",                                     // G
    "I[LFL[ RXFX[ RLPXP",                                         // H
    "NVRFR[ ROFUF RO[U[",                                         // I
    "KYVFVWT[P[MX",                                               // J
    "I[LFL[ RXFLP RPNX[",                                         // K
    "JZLFL[X[",                                                   // L
    "I[K[KFRRYFY[",                                               // M
    "I[L[LFX[XF",                                                 // N
    "I[OFUFYJYWU[O[KWKJOF",                                       // O
    "I[L[LFVFXHXNVPLP",                                           // P
    "I[OFUFYJYWU[O[KWKJOF RTVY[",                                 // Q
    "I[L[LFVFXHXNVPLP RRPX[",                                     // R
    "I[KXN[V[YXYSVPNPKKKINFVFYI",                                 // S
    "JZRFR[ RKFYF",                                               // T
    "I[LFLWO[U[XWXF",                                             // U
    "I[KFR[YF",                                                   // V
    "I[KFN[ROV[YF",                                               // W
    "I[LFX[ RXFL[",                                               // X
    "I[KFRQYF RRQR[",                                             // Y
    "JZLFXFL[X[",                                                 // Z
    "NVUDPDP_U_",                                                 // [
    "JZLFX_",                                                     // backslash
    "NVODTDT_O_",                                                 // ]
    "KYNJRFVJ",                                                   // ^
    "I[J_Z_",                                                     // _
    "OUQFSJ",                                                     // `
    "KYM[RMW[ ROVUV",                                             // a
    "KYNMN[ RNMUMVNVRUTNT RUTVUVZU[N[",                           // b
    "KYWNUMOMMOMYO[U[WZ",                                         // c
    "KYNMN[ RNMTMVPVXT[N[",                                       // d
    "LXVMNMN[V[ RNTTT",                                           // e
    "LXVMNMN[ RNTTT",                                             // f
    "KYWOUMOMMPM_ObUbW_WYTY",                                     // g
    "KYNMN[ RVMV[ RNTVT",                                         // h
    "OURMR[ RPMTM RP[T[",                                         // i
    "MWUMU^TbPbN_",                                               // j
    "KYNMN[ RVMNT RPRV[",                                         // k
    "LXNMN[V[",                                                   // l
    "KYM[MMRUWMW[",                                               // m
    "KYN[NMV[VM",                                                 // n
    "KYPMTMWPWXT[P[MXMPPM",                                       // o
    "KYNbNMUMVOVUUWNW",                                           // p
    "KYPMTMWQW^TbPbM^MQPM RT]Wb",                                 // q
    "KYN[NMUMVNVRUTNT RRTV[",                                     // r
    "KYMYO[U[WYWVUTOTMPMOOMUMWO",                                 // s
    "LXRMR[ RMMWM",                                               // t
    "KYNMNXP[T[VXVM",                                             // u
    "KYMMR[WM",                                                   // v
    "KYMMO[RSU[WM",                                               // w
    "KYNMV[ RVMN[",                                               // x
    "KYMMRXWM RRXRb",                                             // y
    "LXNMVMN[V[",                                                 // z
    "MWUDRFRNOPRRR]U_",                                           // {
    "PTRDR_",                                                     // |
    "MWODRFRNUPRRR]O_",                                           // }
    "JZLROOURXO",                                                 // ~
];
